pub mod api;
pub mod category;
pub mod config;
pub mod discovery;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod utils;
pub mod validator;

pub use api::{analyze, analyze_documents, parse_source, ParsedTokensResult, TokenDocument, TokenSource};
pub use config::EngineConfig;
pub use error::{ResolutionError, TokenDiagnostic, TokenError};
pub use resolver::{ResolutionSummary, ResolvedToken, Resolver};
pub use validator::ValidationMode;

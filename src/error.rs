use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions. Schema, semantic and reference problems are never
/// raised; they are carried inline as data.
#[derive(Error, Debug, Diagnostic)]
pub enum TokenError {
    #[error("Invalid JSON in {name}: {message}")]
    #[diagnostic(
        code(tokens::invalid_json),
        help("Token files must be well-formed JSON documents.")
    )]
    InvalidJson {
        name: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },

    #[error("Token document {name} must be a JSON object, found {found}")]
    #[diagnostic(
        code(tokens::not_an_object),
        help("The root of a token file is a group: an object mapping names to tokens or groups.")
    )]
    NotAnObject { name: String, found: String },

    #[error("Token directory not found: {}", .path.display())]
    #[diagnostic(code(tokens::directory_not_found))]
    DirectoryNotFound { path: PathBuf },

    #[error("Token path is not a directory: {}", .path.display())]
    #[diagnostic(code(tokens::not_a_directory))]
    NotADirectory { path: PathBuf },

    #[error("Failed to read {}", .path.display())]
    #[diagnostic(code(tokens::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(tokens::config))]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// The node does not match the grammar at all.
    Schema,
    /// A typed token is missing or mistypes a type-specific field.
    Semantic,
}

/// One schema or semantic violation, located by its key path from the
/// document root.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{}: {message}", display_path(.path))]
pub struct TokenDiagnostic {
    pub kind: DiagnosticKind,
    pub path: Vec<String>,
    pub message: String,
}

impl TokenDiagnostic {
    pub fn schema(path: &[String], message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Schema,
            path: path.to_vec(),
            message: message.into(),
        }
    }

    pub fn semantic(path: &[String], message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Semantic,
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

impl Diagnostic for TokenDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(match self.kind {
            DiagnosticKind::Schema => "tokens::schema",
            DiagnosticKind::Semantic => "tokens::semantic",
        }))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match self.kind {
            DiagnosticKind::Schema => Some(Box::new(
                "Objects with a `type` or `value` key are treated as tokens and must match their type's shape.",
            )),
            DiagnosticKind::Semantic => None,
        }
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

/// Why a single token failed to resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Malformed reference syntax: {0}")]
    MalformedAlias(String),

    #[error("Reference not found: {{{0}}}")]
    NotFound(String),

    #[error("Circular reference detected: {}", .chain.join(" → "))]
    Circular { chain: Vec<String> },

    #[error("Reference {{{reference}}} could not be resolved: {reason}")]
    Unresolved { reference: String, reason: String },

    #[error("Composite value contains unresolved references: {}", .failed.join(", "))]
    Composite { failed: Vec<String> },
}

impl Serialize for ResolutionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

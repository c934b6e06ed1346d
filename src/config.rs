//! Engine configuration.
//!
//! The token directory is an explicit value handed to [`crate::discovery`]; the
//! validation and resolution core never reads the process environment.

use crate::error::TokenError;
use crate::validator::ValidationMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOKEN_DIR: &str = "tokens";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Directory scanned for `*.json` token files. Relative paths are taken
    /// relative to the caller's working directory.
    pub token_dir: PathBuf,
    pub mode: ValidationMode,
    /// Whether [`crate::discovery::load`] runs a resolution pass and logs its summary.
    pub resolve_references: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_dir: PathBuf::from(DEFAULT_TOKEN_DIR),
            mode: ValidationMode::default(),
            resolve_references: true,
        }
    }
}

impl EngineConfig {
    /// # Errors
    /// Returns [`TokenError::Config`] if the text is not a valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self, TokenError> {
        serde_json::from_str(text).map_err(|e| TokenError::Config(e.to_string()))
    }

    /// # Errors
    /// Returns [`TokenError::Config`] if the text is not a valid configuration.
    pub fn from_yaml_str(text: &str) -> Result<Self, TokenError> {
        serde_yaml::from_str(text).map_err(|e| TokenError::Config(e.to_string()))
    }

    #[must_use]
    pub fn with_token_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.token_dir = dir.as_ref().to_path_buf();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_resolve_references(mut self, resolve: bool) -> Self {
        self.resolve_references = resolve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.token_dir, PathBuf::from("tokens"));
        assert_eq!(config.mode, ValidationMode::Strict);
        assert!(config.resolve_references);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = EngineConfig::from_yaml_str("tokenDir: design/tokens\nmode: bestEffort\n").unwrap();
        assert_eq!(config.token_dir, PathBuf::from("design/tokens"));
        assert_eq!(config.mode, ValidationMode::BestEffort);
        assert!(config.resolve_references);
    }

    #[test]
    fn test_json_config_and_errors() {
        let config = EngineConfig::from_json_str(r#"{ "resolveReferences": false }"#).unwrap();
        assert!(!config.resolve_references);
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "mode": "lenient" }"#),
            Err(TokenError::Config(_))
        ));
    }
}

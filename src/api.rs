use crate::category::{categorize, TokenCategory};
use crate::error::{TokenDiagnostic, TokenError};
use crate::parser::{flatten_all, sorted_tokens, FlattenedToken, TokenMap};
use crate::resolver::{ResolutionSummary, ResolvedToken, Resolver};
use crate::schema::describe;
use crate::utils::get_offset;
use crate::validator::{validate_with_mode, ValidatedDocument, ValidationMode};
use miette::NamedSource;
use serde::Serialize;
use serde_json::{Map, Value};

/// Raw text of one token file, as handed over by whoever read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSource {
    pub name: String,
    pub contents: String,
}

impl TokenSource {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// A parsed token file whose root is known to be an object.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDocument {
    pub name: String,
    pub root: Map<String, Value>,
}

impl TokenDocument {
    /// Wraps an already-parsed JSON value.
    ///
    /// # Errors
    /// Returns [`TokenError::NotAnObject`] if the root is not an object.
    pub fn from_value(name: impl Into<String>, value: Value) -> Result<Self, TokenError> {
        let name = name.into();
        match value {
            Value::Object(root) => Ok(Self { name, root }),
            other => Err(TokenError::NotAnObject {
                name,
                found: describe(&other),
            }),
        }
    }
}

/// Parses the text of one token file.
///
/// # Errors
/// Returns [`TokenError::InvalidJson`] (with a source span pointing at the failure)
/// if the text is not JSON, or [`TokenError::NotAnObject`] if its root is not an object.
pub fn parse_source(contents: &str, name: &str) -> Result<TokenDocument, TokenError> {
    let value: Value = serde_json::from_str(contents).map_err(|err| {
        let offset = get_offset(contents, err.line(), err.column());
        let len = usize::from(offset < contents.len());
        TokenError::InvalidJson {
            name: name.to_string(),
            message: err.to_string(),
            src: NamedSource::new(name, contents.to_string()),
            span: (offset, len).into(),
        }
    })?;
    TokenDocument::from_value(name, value)
}

/// Validated, flattened and categorized tokens from a batch of documents.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTokensResult {
    pub categories: Vec<TokenCategory>,
    pub all_tokens: Vec<FlattenedToken>,
    pub file_count: usize,
    pub errors: Vec<String>,
    /// Set when a loader ran a resolution pass over the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionSummary>,
    #[serde(skip)]
    pub diagnostics: Vec<(String, TokenDiagnostic)>,
    #[serde(skip)]
    tokens: TokenMap,
}

impl ParsedTokensResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.all_tokens.len()
    }

    /// Looks a token up by its exact dash-joined name.
    pub fn token(&self, name: &str) -> Option<&FlattenedToken> {
        self.tokens.get(name)
    }

    pub fn category(&self, name: &str) -> Option<&TokenCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// A fresh resolver over this result's tokens.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.tokens)
    }

    pub fn resolve_all(&self) -> Vec<ResolvedToken> {
        self.resolver().resolve_all()
    }

    pub fn resolve(&self, name: &str) -> Option<ResolvedToken> {
        self.resolver().resolve_one(name)
    }

    /// Serializes the catalog into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the catalog into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Validates, flattens and categorizes already-parsed documents.
///
/// Documents are processed independently: diagnostics for one never stop the
/// others. Tokens are merged in order, so a later document overrides an earlier
/// one that defines the same name, and categories are computed from the union.
pub fn analyze_documents(documents: &[TokenDocument], mode: ValidationMode) -> ParsedTokensResult {
    let mut validated: Vec<ValidatedDocument> = Vec::with_capacity(documents.len());
    let mut diagnostics = Vec::new();

    for document in documents {
        let report = validate_with_mode(&document.root, mode);
        if !report.is_valid() {
            log::warn!(
                "{}: {} validation error(s)",
                document.name,
                report.diagnostics.len()
            );
        }
        diagnostics.extend(
            report
                .diagnostics
                .into_iter()
                .map(|d| (document.name.clone(), d)),
        );
        validated.push(report.document);
    }

    let tokens = flatten_all(&validated);
    log::debug!(
        "flattened {} tokens from {} documents",
        tokens.len(),
        documents.len()
    );

    ParsedTokensResult {
        categories: categorize(&tokens),
        all_tokens: sorted_tokens(&tokens),
        file_count: documents.len(),
        errors: diagnostics
            .iter()
            .map(|(file, d)| format!("{file}: {d}"))
            .collect(),
        resolution: None,
        diagnostics,
        tokens,
    }
}

/// Parses and analyzes raw token files. A file that is not JSON is recorded
/// in `errors` and skipped; the rest of the batch is still processed.
pub fn analyze(sources: &[TokenSource], mode: ValidationMode) -> ParsedTokensResult {
    let mut documents = Vec::with_capacity(sources.len());
    let mut structural = Vec::new();
    for source in sources {
        match parse_source(&source.contents, &source.name) {
            Ok(document) => documents.push(document),
            Err(err) => {
                log::warn!("skipping {}: {err}", source.name);
                structural.push(err.to_string());
            }
        }
    }

    let mut result = analyze_documents(&documents, mode);
    result.file_count = sources.len();
    structural.append(&mut result.errors);
    result.errors = structural;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_catalog_to_json() {
        let source = TokenSource::new(
            "tokens.json",
            r##"{ "colors": { "primary": { "type": "color", "value": "#3b82f6" } } }"##,
        );
        let result = analyze(&[source], ValidationMode::Strict);
        let json: Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["fileCount"], json!(1));
        assert_eq!(json["allTokens"][0]["name"], json!("colors-primary"));
        assert_eq!(json["allTokens"][0]["type"], json!("color"));
        assert_eq!(json["categories"][0]["totalCount"], json!(1));
        assert_eq!(json["errors"], json!([]));
    }

    #[test]
    fn test_simple_catalog_to_yaml() {
        let source = TokenSource::new("t.json", r#"{ "spacing": { "sm": { "type": "dimension", "value": "4px" } } }"#);
        let yaml = analyze(&[source], ValidationMode::Strict).to_yaml().unwrap();
        assert!(yaml.contains("name: spacing-sm"));
        assert!(yaml.contains("fileCount: 1"));
    }

    #[test]
    fn test_invalid_json_has_span() {
        let err = parse_source("{\n  \"a\": \n}", "broken.json").unwrap_err();
        match err {
            TokenError::InvalidJson { name, span, .. } => {
                assert_eq!(name, "broken.json");
                assert!(span.offset() > 0);
            }
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_span_after_multibyte_text() {
        let contents = "{\"é\": 1 x}";
        match parse_source(contents, "accent.json").unwrap_err() {
            TokenError::InvalidJson { span, .. } => {
                assert_eq!(span.offset(), contents.find('x').unwrap());
            }
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_root() {
        assert!(matches!(
            parse_source("[1, 2]", "list.json"),
            Err(TokenError::NotAnObject { .. })
        ));
    }
}

//! Recursive token-group validation.
//!
//! Every non-metadata entry of a group is classified in a fixed order: an
//! object that looks like a token (it has `type` or `value`) is validated as a
//! token and nothing else; any other object is a nested group; anything else
//! is an error. An "almost-token" therefore always produces a diagnostic
//! instead of being absorbed as an empty group.

use crate::error::TokenDiagnostic;
use crate::schema::{
    child_path, describe, is_metadata_key, is_token_candidate, validate_token, TokenType,
    TypedToken,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const INHERITED_TYPE_KEY: &str = "$type";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Any diagnostic voids the whole document.
    #[default]
    Strict,
    /// Diagnostics are reported, and every node that did validate is kept.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenNode {
    Token(TypedToken),
    Group(TokenGroup),
    Invalid,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenGroup {
    pub metadata: Map<String, Value>,
    pub children: IndexMap<String, TokenNode>,
}

impl TokenGroup {
    /// Number of valid tokens anywhere below this group.
    pub fn token_count(&self) -> usize {
        self.children
            .values()
            .map(|child| match child {
                TokenNode::Token(_) => 1,
                TokenNode::Group(group) => group.token_count(),
                TokenNode::Invalid => 0,
            })
            .sum()
    }
}

/// A document after validation, with the same shape as its source but typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedDocument {
    pub root: TokenGroup,
}

/// Output of a best-effort pass: the salvageable tree plus every diagnostic.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub document: ValidatedDocument,
    pub diagnostics: Vec<TokenDiagnostic>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Validates a whole document. Never partially succeeds.
pub fn validate_document(root: &Map<String, Value>) -> Result<ValidatedDocument, Vec<TokenDiagnostic>> {
    let report = validate_best_effort(root);
    if report.is_valid() {
        Ok(report.document)
    } else {
        Err(report.diagnostics)
    }
}

/// Validates a document, keeping every node that passed alongside the diagnostics
/// for the ones that did not.
pub fn validate_best_effort(root: &Map<String, Value>) -> ValidationReport {
    let mut validator = GroupValidator::default();
    let group = validator.validate_group(root, &[], None);
    ValidationReport {
        document: ValidatedDocument { root: group },
        diagnostics: validator.diagnostics,
    }
}

pub fn validate_with_mode(
    root: &Map<String, Value>,
    mode: ValidationMode,
) -> ValidationReport {
    let report = validate_best_effort(root);
    match mode {
        ValidationMode::BestEffort => report,
        ValidationMode::Strict if report.is_valid() => report,
        ValidationMode::Strict => ValidationReport {
            document: ValidatedDocument::default(),
            diagnostics: report.diagnostics,
        },
    }
}

#[derive(Default)]
struct GroupValidator {
    diagnostics: Vec<TokenDiagnostic>,
}

impl GroupValidator {
    fn validate_group(
        &mut self,
        group: &Map<String, Value>,
        path: &[String],
        inherited_type: Option<TokenType>,
    ) -> TokenGroup {
        let mut metadata = Map::new();
        let mut inherited_type = inherited_type;

        for (key, value) in group.iter().filter(|(k, _)| is_metadata_key(k)) {
            if key == INHERITED_TYPE_KEY {
                match value.as_str().map(str::parse::<TokenType>) {
                    Some(Ok(t)) => inherited_type = Some(t),
                    Some(Err(message)) => self
                        .diagnostics
                        .push(TokenDiagnostic::schema(&child_path(path, key), message)),
                    None => self.diagnostics.push(TokenDiagnostic::schema(
                        &child_path(path, key),
                        format!("`$type` must be a string, found {}", describe(value)),
                    )),
                }
            }
            metadata.insert(key.clone(), value.clone());
        }

        let mut children = IndexMap::new();
        for (key, value) in group.iter().filter(|(k, _)| !is_metadata_key(k)) {
            let node_path = child_path(path, key);
            let node = self.validate_node(value, &node_path, inherited_type);
            children.insert(key.clone(), node);
        }

        TokenGroup { metadata, children }
    }

    fn validate_node(
        &mut self,
        value: &Value,
        path: &[String],
        inherited_type: Option<TokenType>,
    ) -> TokenNode {
        let Value::Object(node) = value else {
            self.diagnostics.push(TokenDiagnostic::schema(
                path,
                format!("expected a token or a group, found {}", describe(value)),
            ));
            return TokenNode::Invalid;
        };

        if is_token_candidate(node) {
            return match validate_token(node, path, inherited_type) {
                Ok(token) => TokenNode::Token(token),
                Err(mut errors) => {
                    self.diagnostics.append(&mut errors);
                    TokenNode::Invalid
                }
            };
        }

        let before = self.diagnostics.len();
        let group = self.validate_group(node, path, inherited_type);
        if group.token_count() == 0 {
            if self.diagnostics.len() == before {
                self.diagnostics
                    .push(TokenDiagnostic::schema(path, "group contains no tokens"));
            }
            return TokenNode::Invalid;
        }
        TokenNode::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_nested_groups_and_metadata() {
        let doc = object(json!({
            "$schema": "https://example.com/tokens.schema.json",
            "colors": {
                "$description": "Brand palette",
                "primary": {
                    "500": { "type": "color", "value": "#3b82f6" }
                }
            }
        }));
        let validated = validate_document(&doc).unwrap();
        assert_eq!(validated.root.token_count(), 1);
        assert!(validated.root.metadata.contains_key("$schema"));
        let Some(TokenNode::Group(colors)) = validated.root.children.get("colors") else {
            panic!("colors should be a group");
        };
        assert!(colors.metadata.contains_key("$description"));
    }

    #[test]
    fn test_almost_token_is_an_error_not_a_group() {
        let doc = object(json!({
            "colors": { "primary": { "type": "color", "vaule": "#fff" } }
        }));
        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, vec!["colors", "primary"]);
    }

    #[test]
    fn test_non_object_child_is_an_error() {
        let doc = object(json!({ "colors": { "primary": "#fff" } }));
        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::Schema);
        assert_eq!(errors[0].path, vec!["colors", "primary"]);
    }

    #[test]
    fn test_empty_nested_group_is_an_error() {
        let doc = object(json!({ "spacing": {} }));
        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(errors[0].message, "group contains no tokens");
        assert!(validate_document(&Map::new()).is_ok());
    }

    #[test]
    fn test_diagnostics_in_depth_first_order() {
        let doc = object(json!({
            "a": { "x": { "type": "color", "value": 1 } },
            "b": { "type": "dimension" },
            "c": { "y": { "z": { "type": "border", "value": {} } } }
        }));
        let errors = validate_document(&doc).unwrap_err();
        let paths: Vec<String> = errors.iter().map(|e| e.path.join(".")).collect();
        assert_eq!(
            paths,
            vec!["a.x.value", "b", "c.y.z.value", "c.y.z.value", "c.y.z.value"]
        );
    }

    #[test]
    fn test_best_effort_keeps_valid_siblings() {
        let doc = object(json!({
            "colors": {
                "ok": { "type": "color", "value": "#000" },
                "bad": { "type": "color", "value": "nope" }
            }
        }));
        let report = validate_with_mode(&doc, ValidationMode::BestEffort);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.document.root.token_count(), 1);

        let strict = validate_with_mode(&doc, ValidationMode::Strict);
        assert_eq!(strict.diagnostics.len(), 1);
        assert_eq!(strict.document.root.token_count(), 0);
    }

    #[test]
    fn test_group_type_is_inherited() {
        let doc = object(json!({
            "colors": {
                "$type": "color",
                "primary": { "value": "#3b82f6" },
                "broken": { "value": "16px" }
            }
        }));
        let errors = validate_document(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, vec!["colors", "broken", "value"]);
    }
}

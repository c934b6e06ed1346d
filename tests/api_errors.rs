// API error path tests
// These test error handling, conversions, and edge cases in the API layer

use miette::{Diagnostic, Report};
use token_core::validator::validate_document;
use token_core::{parse_source, EngineConfig, TokenError};

#[test]
fn test_api_parse_invalid_json() {
    let result = parse_source("{ \"colors\": ", "test.json");
    if let Err(TokenError::InvalidJson { .. }) = result {
        // Success
    } else {
        panic!("Expected invalid JSON error");
    }
}

#[test]
fn test_api_parse_non_object_root() {
    let result = parse_source("\"just a string\"", "test.json");
    if let Err(TokenError::NotAnObject { name, found }) = result {
        assert_eq!(name, "test.json");
        assert!(found.starts_with("string"));
    } else {
        panic!("Expected not-an-object error");
    }
}

#[test]
fn test_api_empty_document_is_valid() {
    let document = parse_source("{}", "empty.json").unwrap();
    assert!(validate_document(&document.root).is_ok());
}

#[test]
fn test_api_invalid_json_diagnostic_code() {
    let err = parse_source("{ invalid", "test.json").unwrap_err();
    let code = err.code().map(|c| c.to_string());
    assert_eq!(code.as_deref(), Some("tokens::invalid_json"));
    let rendered = format!("{:?}", Report::new(err));
    assert!(rendered.contains("test.json"));
}

#[test]
fn test_api_token_diagnostic_display() {
    let document = parse_source(
        r#"{ "colors": { "primary": { "type": "color", "value": 12 } } }"#,
        "test.json",
    )
    .unwrap();
    let diagnostics = validate_document(&document.root).unwrap_err();
    assert_eq!(diagnostics.len(), 1);
    let message = diagnostics[0].to_string();
    assert!(message.starts_with("colors.primary.value: invalid color value"));
    assert_eq!(
        diagnostics[0].code().map(|c| c.to_string()).as_deref(),
        Some("tokens::schema")
    );
}

#[test]
fn test_api_invalid_config() {
    let result = EngineConfig::from_yaml_str("mode: [1, 2]");
    assert!(matches!(result, Err(TokenError::Config(_))));
}

#[test]
fn test_api_error_display() {
    if let Err(err) = parse_source("{ invalid", "test.json") {
        let error_string = format!("{}", err);
        assert!(!error_string.is_empty());
        assert!(error_string.starts_with("Invalid JSON in test.json"));
    } else {
        panic!("Should have errored");
    }
}

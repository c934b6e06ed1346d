use serde_json::json;
use token_core::api::{analyze_documents, TokenDocument};
use token_core::category::classify;
use token_core::parser::FlattenedToken;
use token_core::schema::TokenType;
use token_core::ValidationMode;

fn document(name: &str, value: serde_json::Value) -> TokenDocument {
    TokenDocument::from_value(name, value).unwrap()
}

#[test]
fn test_primitives_and_semantic_files() {
    let documents = [
        document("base.json", json!({ "colors": { "base": { "type": "color", "value": "#3b82f6" } } })),
        document("semantic.json", json!({ "colors": { "primary": { "type": "color", "value": "{colors.base}" } } })),
    ];
    let result = analyze_documents(&documents, ValidationMode::Strict);

    let names: Vec<&str> = result.all_tokens.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["colors-base", "colors-primary"]);
    assert_eq!(result.categories.len(), 1);
    assert_eq!(result.categories[0].name, "colors");
    assert_eq!(result.categories[0].total_count, 2);

    let primary = result.resolve("colors-primary").unwrap();
    assert_eq!(primary.resolved_value, json!("#3b82f6"));
    assert!(primary.is_resolved);
    assert_eq!(primary.reference_path.as_deref(), Some("colors.base"));
}

#[test]
fn test_later_document_wins() {
    let documents = [
        document("a.json", json!({ "colors": { "primary": { "type": "color", "value": "#111111" } } })),
        document("b.json", json!({ "colors": { "primary": { "type": "color", "value": "#222222" } } })),
    ];
    let result = analyze_documents(&documents, ValidationMode::Strict);
    assert_eq!(result.token_count(), 1);
    assert_eq!(result.token("colors-primary").unwrap().value, json!("#222222"));
    assert_eq!(result.category("colors").unwrap().total_count, 1);
}

#[test]
fn test_invalid_document_does_not_block_others() {
    let documents = [
        document("broken.json", json!({ "typography": { "h1": { "type": "typography", "value": { "fontWeight": 600 } } } })),
        document("fine.json", json!({ "spacing": { "sm": { "type": "dimension", "value": "4px" } } })),
    ];
    let result = analyze_documents(&documents, ValidationMode::Strict);
    assert_eq!(result.file_count, 2);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors.iter().all(|e| e.starts_with("broken.json: typography.h1.value:")));
    assert_eq!(result.diagnostics.len(), 2);
    assert_eq!(result.token_count(), 1);
    assert!(result.category("spacing").is_some());
}

#[test]
fn test_classify_color_outside_known_category() {
    let token = FlattenedToken {
        name: "brand-primary".to_string(),
        path: vec!["brand".to_string(), "primary".to_string()],
        value: json!("#ff0000"),
        token_type: Some(TokenType::Color),
        description: None,
        extensions: None,
    };
    assert_eq!(classify(&token), "colors");
}

#[test]
fn test_known_category_overrides_declared_type() {
    // Current behavior: the top-level key wins even when it contradicts the type.
    let documents = [document(
        "odd.json",
        json!({ "spacing": { "accent": { "type": "color", "value": "#ff00ff" } } }),
    )];
    let result = analyze_documents(&documents, ValidationMode::Strict);
    assert_eq!(result.category_names(), vec!["spacing"]);
}

#[test]
fn test_resolution_off_returns_raw_catalog() {
    let documents = [document(
        "t.json",
        json!({ "colors": { "a": { "type": "color", "value": "{colors.missing}" } } }),
    )];
    let result = analyze_documents(&documents, ValidationMode::Strict);
    assert!(result.is_valid());
    assert_eq!(result.token("colors-a").unwrap().value, json!("{colors.missing}"));
    let resolved = result.resolve("colors-a").unwrap();
    assert!(!resolved.is_resolved);
    assert_eq!(
        resolved.resolution_error.unwrap().to_string(),
        "Reference not found: {colors.missing}"
    );
}

//! Heuristic category assignment. Classification never fails: an ambiguous
//! token lands in a plausible bucket, or in its own top-level key.

use crate::parser::{FlattenedToken, TokenMap};
use crate::schema::TokenType;
use indexmap::IndexMap;
use serde::Serialize;

/// Categories listed first, in this order. Anything else follows alphabetically.
pub const KNOWN_CATEGORIES: [&str; 7] = [
    "colors",
    "typography",
    "spacing",
    "borders",
    "shadows",
    "animations",
    "components",
];

pub const DIMENSIONS_CATEGORY: &str = "dimensions";

const SPACING_KEYWORDS: &[&str] = &["spacing", "margin", "padding", "gap", "inset"];
const BORDER_KEYWORDS: &[&str] = &["border", "stroke", "outline", "width", "radius"];
const SIZE_SCALE: &[&str] = &["xxs", "xs", "sm", "md", "lg", "xl", "xxl", "2xl", "3xl"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCategory {
    pub name: String,
    pub tokens: Vec<FlattenedToken>,
    pub total_count: usize,
}

pub fn is_known_category(name: &str) -> bool {
    KNOWN_CATEGORIES.contains(&name)
}

fn category_for_type(token_type: TokenType) -> Option<&'static str> {
    match token_type {
        TokenType::Color => Some("colors"),
        TokenType::FontFamily | TokenType::FontWeight | TokenType::Typography => Some("typography"),
        TokenType::Border => Some("borders"),
        TokenType::Shadow => Some("shadows"),
        TokenType::Duration | TokenType::CubicBezier | TokenType::Transition => Some("animations"),
        TokenType::Dimension | TokenType::Number => None,
    }
}

fn classify_dimension(token: &FlattenedToken) -> &'static str {
    let haystack = format!("{} {}", token.path.join(".").to_lowercase(), token.name.to_lowercase());
    if SPACING_KEYWORDS.iter().any(|k| haystack.contains(k)) {
        return "spacing";
    }
    if BORDER_KEYWORDS.iter().any(|k| haystack.contains(k)) {
        return "borders";
    }
    let on_size_scale = token
        .path
        .iter()
        .any(|segment| SIZE_SCALE.contains(&segment.to_lowercase().as_str()));
    if on_size_scale {
        "spacing"
    } else {
        DIMENSIONS_CATEGORY
    }
}

/// Picks the category for one token: a known top-level key wins, then the declared
/// type, then keyword heuristics for dimensions, then the top-level key verbatim.
pub fn classify(token: &FlattenedToken) -> String {
    let top_level = token.top_level();
    if is_known_category(top_level) {
        return top_level.to_string();
    }
    match token.token_type {
        Some(TokenType::Dimension) => classify_dimension(token).to_string(),
        Some(t) => category_for_type(t)
            .map(str::to_string)
            .unwrap_or_else(|| top_level.to_string()),
        None => top_level.to_string(),
    }
}

/// Groups the whole token set into categories, known ones first.
pub fn categorize(tokens: &TokenMap) -> Vec<TokenCategory> {
    let mut buckets: IndexMap<String, Vec<FlattenedToken>> = IndexMap::new();
    for token in tokens.values() {
        buckets.entry(classify(token)).or_default().push(token.clone());
    }

    let mut categories: Vec<TokenCategory> = buckets
        .into_iter()
        .map(|(name, tokens)| TokenCategory {
            total_count: tokens.len(),
            name,
            tokens,
        })
        .collect();
    categories.sort_by(|a, b| category_rank(&a.name).cmp(&category_rank(&b.name)));
    categories
}

fn category_rank(name: &str) -> (usize, &str) {
    let position = KNOWN_CATEGORIES
        .iter()
        .position(|known| *known == name)
        .unwrap_or(KNOWN_CATEGORIES.len());
    (position, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(path: &[&str], token_type: Option<TokenType>) -> FlattenedToken {
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        FlattenedToken {
            name: path.join("-"),
            path,
            value: json!("x"),
            token_type,
            description: None,
            extensions: None,
        }
    }

    #[test]
    fn test_type_decides_when_top_level_is_unknown() {
        assert_eq!(classify(&token(&["brand", "primary"], Some(TokenType::Color))), "colors");
        assert_eq!(classify(&token(&["brand", "motion"], Some(TokenType::Duration))), "animations");
        assert_eq!(classify(&token(&["brand", "body"], Some(TokenType::FontFamily))), "typography");
    }

    #[test]
    fn test_known_top_level_wins_over_type() {
        // Observed precedence: a known category key beats a contradicting type.
        assert_eq!(classify(&token(&["colors", "gap"], Some(TokenType::Dimension))), "colors");
        assert_eq!(classify(&token(&["shadows", "tint"], Some(TokenType::Color))), "shadows");
    }

    #[test]
    fn test_dimension_heuristics() {
        let d = Some(TokenType::Dimension);
        assert_eq!(classify(&token(&["layout", "padding", "x"], d)), "spacing");
        assert_eq!(classify(&token(&["size", "md"], d)), "spacing");
        assert_eq!(classify(&token(&["radius", "card"], d)), "borders");
        assert_eq!(classify(&token(&["outline", "focus"], d)), "borders");
        assert_eq!(classify(&token(&["breakpoint", "tablet"], d)), "dimensions");
    }

    #[test]
    fn test_border_keywords_beat_size_scale() {
        let d = Some(TokenType::Dimension);
        assert_eq!(classify(&token(&["border", "sm"], d)), "borders");
        assert_eq!(classify(&token(&["stroke", "lg"], d)), "borders");
        assert_eq!(classify(&token(&["padding", "border", "sm"], d)), "spacing");
        assert_eq!(classify(&token(&["control", "xl"], d)), "spacing");
    }

    #[test]
    fn test_fallback_is_top_level_key() {
        assert_eq!(classify(&token(&["opacity", "muted"], Some(TokenType::Number))), "opacity");
        assert_eq!(classify(&token(&["z", "modal"], None)), "z");
    }

    #[test]
    fn test_category_order() {
        let mut tokens = TokenMap::new();
        for t in [
            token(&["zindex", "modal"], None),
            token(&["spacing", "sm"], Some(TokenType::Dimension)),
            token(&["alpha", "a"], None),
            token(&["colors", "red"], Some(TokenType::Color)),
            token(&["colors", "blue"], Some(TokenType::Color)),
        ] {
            tokens.insert(t.name.clone(), t);
        }
        let categories = categorize(&tokens);
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["colors", "spacing", "alpha", "zindex"]);
        assert_eq!(categories[0].total_count, 2);
        assert_eq!(categories[0].tokens[0].name, "colors-red");
    }
}

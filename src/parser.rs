use crate::schema::{TokenType, TypedToken};
use crate::validator::{TokenGroup, TokenNode, ValidatedDocument};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// One leaf token, keyed by its dash-joined path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedToken {
    pub name: String,
    pub path: Vec<String>,
    pub value: Value,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl FlattenedToken {
    fn from_typed(path: Vec<String>, token: &TypedToken) -> Self {
        Self {
            name: path.join("-"),
            path,
            value: token.value.clone(),
            token_type: token.token_type,
            description: token.description.clone(),
            extensions: token.extensions.clone(),
        }
    }

    /// The path joined with dots, the form aliases are usually written in.
    pub fn dot_path(&self) -> String {
        self.path.join(".")
    }

    pub fn top_level(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }
}

/// Flat token map in first-seen order. Re-inserting a name keeps its position
/// and replaces its value.
pub type TokenMap = IndexMap<String, FlattenedToken>;

/// Turns every leaf token of a validated document into a [`FlattenedToken`].
/// Nodes that failed validation are skipped.
pub fn flatten(document: &ValidatedDocument) -> TokenMap {
    let mut tokens = TokenMap::new();
    flatten_into(&document.root, &mut Vec::new(), &mut tokens);
    tokens
}

/// Flattens documents in order into one map; later documents win on collisions.
pub fn flatten_all<'a, I>(documents: I) -> TokenMap
where
    I: IntoIterator<Item = &'a ValidatedDocument>,
{
    let mut merged = TokenMap::new();
    for document in documents {
        for (name, token) in flatten(document) {
            if merged.contains_key(&name) {
                log::debug!("token `{name}` redefined by a later document");
            }
            merged.insert(name, token);
        }
    }
    merged
}

fn flatten_into(group: &TokenGroup, path: &mut Vec<String>, tokens: &mut TokenMap) {
    for (key, node) in &group.children {
        path.push(key.clone());
        match node {
            TokenNode::Token(token) => {
                let flat = FlattenedToken::from_typed(path.clone(), token);
                tokens.insert(flat.name.clone(), flat);
            }
            TokenNode::Group(child) => flatten_into(child, path, tokens),
            TokenNode::Invalid => {}
        }
        path.pop();
    }
}

/// Tokens sorted by name, the order catalog listings use.
pub fn sorted_tokens(tokens: &TokenMap) -> Vec<FlattenedToken> {
    let mut all: Vec<FlattenedToken> = tokens.values().cloned().collect();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    all
}

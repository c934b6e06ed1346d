//! Token grammar: what a legal `value` looks like for each declared `type`.
//!
//! A node is checked against three alternatives, in order:
//!
//! 1. a *reference token*: the value is a bare alias string such as
//!    `{colors.primary.500}`, accepted whatever the declared type is;
//! 2. a *typed token*: the value matches the shape registered for its `type`;
//! 3. an *untyped token*: there is no type at all and the value is a primitive
//!    or a passthrough object.
//!
//! Failing all of them yields every violated constraint, located by path.

use crate::error::TokenDiagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::str::FromStr;

pub const TYPE_KEY: &str = "type";
pub const VALUE_KEY: &str = "value";
pub const DESCRIPTION_KEY: &str = "description";
pub const EXTENSIONS_KEY: &str = "extensions";

/// Keys starting with this prefix are metadata (`$schema`, `$type`, `$description`, ...).
pub const METADATA_PREFIX: char = '$';

static ALIAS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{([^}]+)\}$").unwrap());
static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

const COLOR_KEYWORDS: &[&str] = &[
    "transparent",
    "currentColor",
    "inherit",
    "initial",
    "unset",
    "black",
    "white",
];

/// Returns the reference name when `text` is exactly `{` + one or more non-`}` characters + `}`.
pub fn parse_alias(text: &str) -> Option<&str> {
    ALIAS_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_alias(value: &Value) -> bool {
    value.as_str().is_some_and(|s| parse_alias(s).is_some())
}

pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_PREFIX)
}

/// The structural "looks like a token" predicate. Checked before a node is
/// ever treated as a group.
pub fn is_token_candidate(node: &Map<String, Value>) -> bool {
    node.contains_key(TYPE_KEY) || node.contains_key(VALUE_KEY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    Color,
    Dimension,
    Duration,
    FontFamily,
    FontWeight,
    Number,
    Typography,
    Border,
    Shadow,
    CubicBezier,
    Transition,
}

impl TokenType {
    pub const ALL: [TokenType; 11] = [
        TokenType::Color,
        TokenType::Dimension,
        TokenType::Duration,
        TokenType::FontFamily,
        TokenType::FontWeight,
        TokenType::Number,
        TokenType::Typography,
        TokenType::Border,
        TokenType::Shadow,
        TokenType::CubicBezier,
        TokenType::Transition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Dimension => "dimension",
            TokenType::Duration => "duration",
            TokenType::FontFamily => "fontFamily",
            TokenType::FontWeight => "fontWeight",
            TokenType::Number => "number",
            TokenType::Typography => "typography",
            TokenType::Border => "border",
            TokenType::Shadow => "shadow",
            TokenType::CubicBezier => "cubicBezier",
            TokenType::Transition => "transition",
        }
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown token type `{s}`"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    Hex(String),
    Keyword(String),
    Alias(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberOrString {
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub font_family: Value,
    pub font_size: Value,
    pub font_weight: Option<Value>,
    pub letter_spacing: Option<Value>,
    pub line_height: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub color: Value,
    pub width: Value,
    pub style: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub color: Value,
    pub offset_x: Value,
    pub offset_y: Value,
    pub blur: Value,
    pub spread: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub duration: Value,
    pub timing_function: Value,
    pub delay: Option<Value>,
}

/// The typed reading of a token's value.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Reference(String),
    Color(Color),
    Dimension(String),
    Duration(String),
    FontFamily(Vec<String>),
    FontWeight(NumberOrString),
    Number(NumberOrString),
    Typography(Typography),
    Border(Border),
    Shadow(Vec<Shadow>),
    CubicBezier([f64; 4]),
    Transition(Transition),
    Untyped(Value),
}

/// A node accepted by the grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedToken {
    pub token_type: Option<TokenType>,
    pub kind: TokenKind,
    pub value: Value,
    pub description: Option<String>,
    pub extensions: Option<Map<String, Value>>,
}

/// Validates a single token candidate located at `path`. `inherited_type` is the
/// nearest enclosing group's `$type`, used when the node has no `type` of its own.
pub fn validate_token(
    node: &Map<String, Value>,
    path: &[String],
    inherited_type: Option<TokenType>,
) -> Result<TypedToken, Vec<TokenDiagnostic>> {
    let mut errors = Vec::new();

    let declared_type = match node.get(TYPE_KEY) {
        None => inherited_type,
        Some(Value::String(tag)) => match tag.parse::<TokenType>() {
            Ok(t) => Some(t),
            Err(message) => {
                errors.push(TokenDiagnostic::schema(path, message));
                None
            }
        },
        Some(other) => {
            errors.push(TokenDiagnostic::schema(
                path,
                format!("`type` must be a string, found {}", describe(other)),
            ));
            None
        }
    };

    let description = match node.get(DESCRIPTION_KEY) {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(TokenDiagnostic::schema(
                path,
                format!("`description` must be a string, found {}", describe(other)),
            ));
            None
        }
    };

    let extensions = match node.get(EXTENSIONS_KEY) {
        None => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(other) => {
            errors.push(TokenDiagnostic::schema(
                path,
                format!("`extensions` must be an object, found {}", describe(other)),
            ));
            None
        }
    };

    let Some(value) = node.get(VALUE_KEY) else {
        let message = match node.get(TYPE_KEY) {
            Some(_) => "token declares a type but has no `value`",
            None => "token has no `value`",
        };
        errors.push(TokenDiagnostic::schema(path, message));
        return Err(errors);
    };

    let kind = if let Some(name) = value.as_str().and_then(parse_alias) {
        Ok(TokenKind::Reference(name.to_string()))
    } else {
        match declared_type {
            Some(token_type) => validate_typed_value(token_type, value, path),
            None if node.contains_key(TYPE_KEY) => Err(Vec::new()),
            None => validate_untyped_value(value, path),
        }
    };

    match kind {
        Ok(kind) if errors.is_empty() => Ok(TypedToken {
            token_type: declared_type,
            kind,
            value: value.clone(),
            description,
            extensions,
        }),
        Ok(_) => Err(errors),
        Err(mut value_errors) => {
            errors.append(&mut value_errors);
            Err(errors)
        }
    }
}

fn validate_untyped_value(value: &Value, path: &[String]) -> Result<TokenKind, Vec<TokenDiagnostic>> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Object(_) => {
            Ok(TokenKind::Untyped(value.clone()))
        }
        other => Err(vec![TokenDiagnostic::schema(
            path,
            format!(
                "untyped token value must be a string, number, boolean or object, found {}",
                describe(other)
            ),
        )]),
    }
}

/// Checks `value` against the shape registered for `token_type`.
pub fn validate_typed_value(
    token_type: TokenType,
    value: &Value,
    path: &[String],
) -> Result<TokenKind, Vec<TokenDiagnostic>> {
    let value_path = child_path(path, VALUE_KEY);
    let mismatch = |expected: &str| {
        vec![TokenDiagnostic::schema(
            &value_path,
            format!(
                "invalid {token_type} value: expected {expected}, found {}",
                describe(value)
            ),
        )]
    };

    match token_type {
        TokenType::Color => {
            let color = match value.as_str() {
                Some(s) => parse_color(s).ok_or_else(|| {
                    mismatch("a hex color (#RGB or #RRGGBB), a CSS color keyword or a reference")
                }),
                None => Err(mismatch("a color string")),
            };
            color.map(TokenKind::Color)
        }
        TokenType::Dimension => value
            .as_str()
            .map(|s| TokenKind::Dimension(s.to_string()))
            .ok_or_else(|| mismatch("a string")),
        TokenType::Duration => value
            .as_str()
            .map(|s| TokenKind::Duration(s.to_string()))
            .ok_or_else(|| mismatch("a string")),
        TokenType::FontFamily => font_family(value)
            .map(TokenKind::FontFamily)
            .ok_or_else(|| mismatch("a string or an array of strings")),
        TokenType::FontWeight => number_or_string(value)
            .map(TokenKind::FontWeight)
            .ok_or_else(|| mismatch("a number or a string")),
        TokenType::Number => number_or_string(value)
            .map(TokenKind::Number)
            .ok_or_else(|| mismatch("a number or a string")),
        TokenType::CubicBezier => cubic_bezier(value)
            .map(TokenKind::CubicBezier)
            .ok_or_else(|| mismatch("an array of four numbers with x-coordinates in [0, 1]")),
        TokenType::Typography => match value {
            Value::Object(fields) => typography(fields, &value_path).map(TokenKind::Typography),
            _ => Err(mismatch("an object")),
        },
        TokenType::Border => match value {
            Value::Object(fields) => border(fields, &value_path).map(TokenKind::Border),
            _ => Err(mismatch("an object")),
        },
        TokenType::Transition => match value {
            Value::Object(fields) => transition(fields, &value_path).map(TokenKind::Transition),
            _ => Err(mismatch("an object")),
        },
        TokenType::Shadow => match value {
            Value::Object(fields) => shadow(fields, &value_path).map(|s| TokenKind::Shadow(vec![s])),
            Value::Array(layers) => {
                let mut shadows = Vec::new();
                let mut errors = Vec::new();
                for (i, layer) in layers.iter().enumerate() {
                    let layer_path = child_path(&value_path, &i.to_string());
                    match layer {
                        Value::Object(fields) => match shadow(fields, &layer_path) {
                            Ok(s) => shadows.push(s),
                            Err(mut e) => errors.append(&mut e),
                        },
                        other => errors.push(TokenDiagnostic::schema(
                            &layer_path,
                            format!("shadow layer must be an object, found {}", describe(other)),
                        )),
                    }
                }
                if errors.is_empty() {
                    Ok(TokenKind::Shadow(shadows))
                } else {
                    Err(errors)
                }
            }
            _ => Err(mismatch("an object or an array of objects")),
        },
    }
}

fn parse_color(s: &str) -> Option<Color> {
    if HEX_COLOR_RE.is_match(s) {
        Some(Color::Hex(s.to_string()))
    } else if COLOR_KEYWORDS.contains(&s) {
        Some(Color::Keyword(s.to_string()))
    } else {
        parse_alias(s).map(|name| Color::Alias(name.to_string()))
    }
}

fn font_family(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

fn number_or_string(value: &Value) -> Option<NumberOrString> {
    match value {
        Value::Number(n) => n.as_f64().map(NumberOrString::Number),
        Value::String(s) => Some(NumberOrString::String(s.clone())),
        _ => None,
    }
}

fn cubic_bezier(value: &Value) -> Option<[f64; 4]> {
    let items = value.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut points = [0.0; 4];
    for (slot, item) in points.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    let x_in_range = |x: f64| (0.0..=1.0).contains(&x);
    (x_in_range(points[0]) && x_in_range(points[2])).then_some(points)
}

/// Collects required and optional sub-fields of a composite value, emitting one
/// semantic diagnostic per missing required field and per mistyped field.
struct Fields<'a> {
    fields: &'a Map<String, Value>,
    path: &'a [String],
    errors: Vec<TokenDiagnostic>,
}

impl<'a> Fields<'a> {
    fn new(fields: &'a Map<String, Value>, path: &'a [String]) -> Self {
        Self {
            fields,
            path,
            errors: Vec::new(),
        }
    }

    fn required(&mut self, type_name: &str, key: &str, check: fn(&Value) -> bool) -> Value {
        match self.fields.get(key) {
            Some(value) => {
                self.check(key, value, check);
                value.clone()
            }
            None => {
                self.errors.push(TokenDiagnostic::semantic(
                    self.path,
                    format!("{type_name} token is missing required field `{key}`"),
                ));
                Value::Null
            }
        }
    }

    fn optional(&mut self, key: &str, check: fn(&Value) -> bool) -> Option<Value> {
        let value = self.fields.get(key)?;
        self.check(key, value, check);
        Some(value.clone())
    }

    fn check(&mut self, key: &str, value: &Value, check: fn(&Value) -> bool) {
        if !is_alias(value) && !check(value) {
            self.errors.push(TokenDiagnostic::semantic(
                &child_path(self.path, key),
                format!("field `{key}` has an invalid value: {}", describe(value)),
            ));
        }
    }

    fn finish<T>(self, value: T) -> Result<T, Vec<TokenDiagnostic>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

fn is_string(value: &Value) -> bool {
    value.is_string()
}

fn is_number_or_string(value: &Value) -> bool {
    value.is_number() || value.is_string()
}

fn is_font_family(value: &Value) -> bool {
    font_family(value).is_some()
}

fn is_color(value: &Value) -> bool {
    value.as_str().is_some_and(|s| parse_color(s).is_some())
}

fn typography(fields: &Map<String, Value>, path: &[String]) -> Result<Typography, Vec<TokenDiagnostic>> {
    let mut f = Fields::new(fields, path);
    let value = Typography {
        font_family: f.required("typography", "fontFamily", is_font_family),
        font_size: f.required("typography", "fontSize", is_string),
        font_weight: f.optional("fontWeight", is_number_or_string),
        letter_spacing: f.optional("letterSpacing", is_string),
        line_height: f.optional("lineHeight", is_number_or_string),
    };
    f.finish(value)
}

fn border(fields: &Map<String, Value>, path: &[String]) -> Result<Border, Vec<TokenDiagnostic>> {
    let mut f = Fields::new(fields, path);
    let value = Border {
        color: f.required("border", "color", is_color),
        width: f.required("border", "width", is_string),
        style: f.required("border", "style", is_string),
    };
    f.finish(value)
}

fn shadow(fields: &Map<String, Value>, path: &[String]) -> Result<Shadow, Vec<TokenDiagnostic>> {
    let mut f = Fields::new(fields, path);
    let value = Shadow {
        color: f.required("shadow", "color", is_color),
        offset_x: f.required("shadow", "offsetX", is_string),
        offset_y: f.required("shadow", "offsetY", is_string),
        blur: f.required("shadow", "blur", is_string),
        spread: f.optional("spread", is_string),
    };
    f.finish(value)
}

fn transition(fields: &Map<String, Value>, path: &[String]) -> Result<Transition, Vec<TokenDiagnostic>> {
    let mut f = Fields::new(fields, path);
    let value = Transition {
        duration: f.required("transition", "duration", is_string),
        timing_function: f.required("transition", "timingFunction", |v| {
            v.is_string() || cubic_bezier(v).is_some()
        }),
        delay: f.optional("delay", is_string),
    };
    f.finish(value)
}

pub(crate) fn child_path(path: &[String], key: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(key.to_string());
    child
}

/// Short human-readable name of a JSON value's kind.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {} items", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

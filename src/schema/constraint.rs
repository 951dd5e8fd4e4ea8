//! Named constraints attached to schema fields

use crate::error::{ConfigError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A named rule checked against a field value after defaults are applied.
///
/// Serialized externally tagged, so schema files write `{ min = 1 }`,
/// `{ one_of = ["a", "b"] }` or plain `"not_empty"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    OneOf(Vec<Value>),
    Min(f64),
    Max(f64),
    MinLength(usize),
    MaxLength(usize),
    Pattern(Pattern),
    NotEmpty,
}

/// Regular expression for the `pattern` rule, compiled once when the schema
/// is built or read. Schema files carry it as a plain string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.0.is_match(s)
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(pattern: String) -> std::result::Result<Self, Self::Error> {
        Self::new(&pattern)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.as_str().to_string()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Constraint {
    /// Build a `pattern` rule. An invalid expression is a schema error.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Pattern::new(pattern).map(Constraint::Pattern).map_err(|e| ConfigError::Schema {
            path: format!("pattern `{pattern}`"),
            message: e.to_string(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::OneOf(_) => "one_of",
            Constraint::Min(_) => "min",
            Constraint::Max(_) => "max",
            Constraint::MinLength(_) => "min_length",
            Constraint::MaxLength(_) => "max_length",
            Constraint::Pattern(_) => "pattern",
            Constraint::NotEmpty => "not_empty",
        }
    }

    /// Check `value`, returning the failure message if the rule does not hold.
    ///
    /// A value of the wrong kind (e.g. `min` on a string) fails the rule rather
    /// than being skipped.
    pub fn check(&self, field: &str, value: &Value) -> Option<String> {
        match self {
            Constraint::OneOf(allowed) => {
                if allowed.contains(value) {
                    return None;
                }
                let rendered =
                    allowed.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                Some(format!("{field} must be one of the following values: {rendered}"))
            }
            Constraint::Min(min) => match value.as_f64() {
                Some(n) if n >= *min => None,
                _ => Some(format!("{field} must not be less than {min}")),
            },
            Constraint::Max(max) => match value.as_f64() {
                Some(n) if n <= *max => None,
                _ => Some(format!("{field} must not be greater than {max}")),
            },
            Constraint::MinLength(min) => match length_of(value) {
                Some(len) if len >= *min => None,
                _ => Some(format!("{field} must have a length of at least {min}")),
            },
            Constraint::MaxLength(max) => match length_of(value) {
                Some(len) if len <= *max => None,
                _ => Some(format!("{field} must have a length of at most {max}")),
            },
            Constraint::Pattern(pattern) => match value.as_str() {
                Some(s) if pattern.is_match(s) => None,
                _ => Some(format!("{field} must match `{pattern}` regular expression")),
            },
            Constraint::NotEmpty => {
                let empty = match value {
                    Value::Null => true,
                    Value::String(s) => s.is_empty(),
                    Value::Array(items) => items.is_empty(),
                    Value::Object(map) => map.is_empty(),
                    Value::Bool(_) | Value::Number(_) => false,
                };
                empty.then(|| format!("{field} should not be empty"))
            }
        }
    }
}

/// Character count for strings, element count for arrays.
fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

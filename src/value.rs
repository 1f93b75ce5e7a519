//! Typed token values

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Mapping of token name to value, as produced by parsing and consumed by formatting
pub type Fields = BTreeMap<String, TokenValue>;

/// A value in a token's domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Int(i64),
    Str(String),
}

impl TokenValue {
    /// Short name of the value type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            TokenValue::Int(_) => "integer",
            TokenValue::Str(_) => "string",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TokenValue::Int(n) => Some(*n),
            TokenValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::Int(_) => None,
            TokenValue::Str(s) => Some(s),
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Int(n) => write!(f, "{}", n),
            TokenValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for TokenValue {
    fn from(n: i64) -> Self {
        TokenValue::Int(n)
    }
}

impl From<i32> for TokenValue {
    fn from(n: i32) -> Self {
        TokenValue::Int(n.into())
    }
}

impl From<u32> for TokenValue {
    fn from(n: u32) -> Self {
        TokenValue::Int(n.into())
    }
}

impl From<&str> for TokenValue {
    fn from(s: &str) -> Self {
        TokenValue::Str(s.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(s: String) -> Self {
        TokenValue::Str(s)
    }
}

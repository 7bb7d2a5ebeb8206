//! Property values and the priority merge rule

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A property value attached to a node or edge. The shape is restricted to
/// what survives a serialization round trip: scalars, strings, ordered
/// string lists and nested mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Integer scalar
    Int(i64),
    /// Floating point scalar
    Float(f64),
    /// Free-form string
    Text(String),
    /// Ordered list of strings
    List(Vec<String>),
    /// Nested mapping; keys are emitted sorted
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Borrow the string content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, widening from nothing else
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float content; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Boolean content
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
            Self::Map(map) => write!(f, "{{{} keys}}", map.len()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<usize> for PropertyValue {
    fn from(i: usize) -> Self {
        Self::Int(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Placeholder strings that concrete values are allowed to displace
const FALLBACK_SENTINELS: [&str; 3] = ["UNKNOWN", "BOTH", "UNSPECIFIED"];

/// Rank of a value in the merge lattice; higher ranks win. The ordering is
/// total so the merge outcome is independent of write order.
fn merge_rank(value: &PropertyValue) -> u8 {
    match value {
        PropertyValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("N/A") || trimmed == "null" {
                0
            } else if trimmed.starts_with("ERROR:") {
                1
            } else if FALLBACK_SENTINELS.contains(&trimmed) {
                2
            } else if trimmed.parse::<f64>().is_ok() {
                4
            } else {
                3
            }
        }
        PropertyValue::List(items) if items.is_empty() => 3,
        PropertyValue::Map(map) if map.is_empty() => 3,
        // Typed scalars, non-empty lists and maps are concrete.
        _ => 4,
    }
}

/// Merge a newly written value into an existing one under the priority
/// rule. Ties keep the existing value, so repeated identical writes are
/// idempotent and the result is order-independent for distinct ranks.
pub fn merge_values(existing: &PropertyValue, incoming: &PropertyValue) -> PropertyValue {
    if merge_rank(incoming) > merge_rank(existing) {
        incoming.clone()
    } else {
        existing.clone()
    }
}

/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document value type.
//!
//! A [`Value`] is one of the leaves or branches of a built document. Values
//! are format-neutral: codecs decide how each variant is written.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A value stored under a document key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An absent value (`nil`).
    #[default]
    Null,

    /// A boolean value.
    Bool(bool),

    /// A signed integer value.
    Integer(i64),

    /// A floating point value.
    Float(f64),

    /// A string value.
    String(String),

    /// An ordered sequence of values.
    Array(Vec<Value>),

    /// A nested document.
    Document(Document),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is "empty".
    ///
    /// Null, the empty string, an empty array and an empty document are all
    /// empty. Scalars other than the empty string never are.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Document(doc) => doc.is_empty(),
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Consume the value, returning the document it holds (if any).
    pub fn into_document(self) -> Option<Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// A short name for the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    /// Get a nested value by key path.
    ///
    /// Only documents can be traversed; any other value ends the walk.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            Value::Document(doc) => doc.get(first).and_then(|v| v.get_path(rest)),
            _ => None,
        }
    }

    /// Render a scalar as plain text.
    ///
    /// Null renders as the empty string. Arrays and documents have no
    /// plain-text form and return `None`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Array(_) | Value::Document(_) => None,
        }
    }

    /// Total ordering used when sorting sequences of values.
    ///
    /// Values of different kinds are ordered null < boolean < number <
    /// string < array < document. Numbers compare numerically regardless of
    /// integer/float representation.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Integer(_) | Value::Float(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Document(_) => 5,
            }
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                let a = self.as_f64().unwrap_or_default();
                let b = other.as_f64().unwrap_or_default();
                a.total_cmp(&b)
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.len().cmp(&b.len()),
            (Value::Document(a), Value::Document(b)) => a.len().cmp(&b.len()),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Document(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::Array(vec![]).is_empty());
        assert!(Value::Document(Document::new()).is_empty());

        assert!(!Value::from(false).is_empty());
        assert!(!Value::from(0).is_empty());
        assert!(!Value::from("x").is_empty());
    }

    #[test]
    fn test_get_path() {
        let value = Value::from(serde_json::json!({
            "employee": { "salary": 50000 }
        }));

        assert_eq!(
            value.get_path(&["employee", "salary"]),
            Some(&Value::Integer(50000))
        );
        assert_eq!(value.get_path(&["employee", "name"]), None);
        assert_eq!(value.get_path(&[]), Some(&value));
    }

    #[test]
    fn test_sort_cmp_mixes_numbers() {
        assert_eq!(Value::from(1).sort_cmp(&Value::from(1.5)), Ordering::Less);
        assert_eq!(Value::from(2.0).sort_cmp(&Value::from(2)), Ordering::Equal);
        assert_eq!(Value::Null.sort_cmp(&Value::from("a")), Ordering::Less);
        assert_eq!(Value::from("b").sort_cmp(&Value::from("a")), Ordering::Greater);
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from(serde_json::json!(12)), Value::Integer(12));
        assert_eq!(Value::from(serde_json::json!(1.25)), Value::Float(1.25));
    }

    #[test]
    fn test_serializes_untagged() {
        let value = Value::from(serde_json::json!({"a": [1, null, "x"]}));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"a":[1,null,"x"]}"#);
    }
}

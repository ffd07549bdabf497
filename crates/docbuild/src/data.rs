/*
 * data.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Input data model.
//!
//! Templates are evaluated against [`Data`]: scalars, [`Record`]s (objects
//! with named members) and [`DataList`]s (ordered collections). Records are
//! fixed-shape and are never treated as collections, even though their
//! members can be enumerated.

use docbuild_document::{Document, Value};
use indexmap::IndexMap;

/// A value a template can be evaluated against.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Data {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(DataList),
    Record(Record),
}

/// An object with named members.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Element name derived from the object's type (e.g. `user`).
    kind: Option<String>,

    /// Stable content key (e.g. `users/1-20250101`), used for caching.
    cache_key: Option<String>,

    fields: IndexMap<String, Data>,
}

/// An ordered collection of data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataList {
    /// Collection-level identifier (e.g. a table name).
    name: Option<String>,

    items: Vec<Data>,
}

impl Data {
    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    /// Check if this value is "blank": null, false, a whitespace-only
    /// string, or an empty list. Records are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Data::Null | Data::Bool(false) => true,
            Data::String(s) => s.trim().is_empty(),
            Data::List(list) => list.is_empty(),
            Data::Bool(true) | Data::Integer(_) | Data::Float(_) | Data::Record(_) => false,
        }
    }

    /// Truthiness for conditions: everything except null and `false`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Data::Null | Data::Bool(false))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Data::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&DataList> {
        match self {
            Data::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a member of a record. Other values expose no members.
    pub fn member(&self, name: &str) -> Option<&Data> {
        self.as_record().and_then(|record| record.get(name))
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    /// Element name derived from this value's type.
    ///
    /// Records report their declared kind (falling back to `record`);
    /// other values report their variant name.
    pub fn type_name(&self) -> &str {
        match self {
            Data::Null => "nil",
            Data::Bool(_) => "boolean",
            Data::Integer(_) => "integer",
            Data::Float(_) => "float",
            Data::String(_) => "string",
            Data::List(_) => "list",
            Data::Record(record) => record.kind().unwrap_or("record"),
        }
    }

    /// Stable content key for caching.
    ///
    /// Only records carry one. Collections are cached per element.
    pub fn content_key(&self) -> Option<String> {
        match self {
            Data::Record(record) => record.cache_key.clone(),
            _ => None,
        }
    }

    /// Plain value representation: records become documents of all their
    /// members and lists become arrays.
    pub fn to_value(&self) -> Value {
        match self {
            Data::Null => Value::Null,
            Data::Bool(b) => Value::Bool(*b),
            Data::Integer(i) => Value::Integer(*i),
            Data::Float(f) => Value::Float(*f),
            Data::String(s) => Value::String(s.clone()),
            Data::List(list) => Value::Array(list.iter().map(Data::to_value).collect()),
            Data::Record(record) => Value::Document(record.to_document()),
        }
    }
}

impl Record {
    /// Create an empty record whose type-derived name is `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Create an empty record with no type-derived name.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Data>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Data>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Data> {
        self.fields.get(name)
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Data)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn to_document(&self) -> Document {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_value()))
            .collect()
    }
}

impl DataList {
    pub fn new(items: Vec<Data>) -> Self {
        Self { name: None, items }
    }

    /// Create a list carrying a collection-level identifier.
    pub fn named(name: impl Into<String>, items: Vec<Data>) -> Self {
        Self {
            name: Some(name.into()),
            items,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn items(&self) -> &[Data] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Data> {
        self.items
    }

    pub fn first(&self) -> Option<&Data> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Data> {
        self.items.iter()
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Data::Bool(value)
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Integer(value)
    }
}

impl From<i32> for Data {
    fn from(value: i32) -> Self {
        Data::Integer(i64::from(value))
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Float(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_string())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl From<Record> for Data {
    fn from(value: Record) -> Self {
        Data::Record(value)
    }
}

impl From<DataList> for Data {
    fn from(value: DataList) -> Self {
        Data::List(value)
    }
}

impl<T: Into<Data>> From<Vec<T>> for Data {
    fn from(values: Vec<T>) -> Self {
        Data::List(DataList::new(values.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(value: Option<T>) -> Self {
        value.map_or(Data::Null, Into::into)
    }
}

/// JSON objects become anonymous records and arrays become unnamed lists.
impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Data::Null,
            serde_json::Value::Bool(b) => Data::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Data::Integer(i),
                None => Data::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Data::String(s),
            serde_json::Value::Array(items) => {
                Data::List(DataList::new(items.into_iter().map(Data::from).collect()))
            }
            serde_json::Value::Object(map) => {
                let mut record = Record::anonymous();
                for (name, value) in map {
                    record.insert(name, Data::from(value));
                }
                Data::Record(record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user(id: i64) -> Data {
        Record::new("user")
            .with_field("id", id)
            .with_cache_key(format!("users/{id}"))
            .into()
    }

    #[test]
    fn test_blank_and_truthy() {
        assert!(Data::Null.is_blank());
        assert!(Data::from(false).is_blank());
        assert!(Data::from("  ").is_blank());
        assert!(Data::from(Vec::<Data>::new()).is_blank());
        assert!(!Data::from(0).is_blank());
        assert!(!Data::Record(Record::anonymous()).is_blank());

        assert!(Data::from(0).is_truthy());
        assert!(Data::from("").is_truthy());
        assert!(!Data::Null.is_truthy());
        assert!(!Data::from(false).is_truthy());
    }

    #[test]
    fn test_content_key() {
        assert_eq!(user(1).content_key(), Some("users/1".to_string()));

        assert_eq!(Data::Record(Record::new("user")).content_key(), None);

        let list = Data::List(DataList::named("users", vec![user(1), user(2)]));
        assert_eq!(list.content_key(), None);
        assert_eq!(Data::from("users/1").content_key(), None);
    }

    #[test]
    fn test_to_value() {
        let data = Data::Record(
            Record::new("user")
                .with_field("name", "leo")
                .with_field("tags", vec!["a", "b"]),
        );
        assert_eq!(
            serde_json::to_value(data.to_value()).unwrap(),
            serde_json::json!({ "name": "leo", "tags": ["a", "b"] })
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(user(1).type_name(), "user");
        assert_eq!(Data::Record(Record::anonymous()).type_name(), "record");
        assert_eq!(Data::from("x").type_name(), "string");
    }

    #[test]
    fn test_from_json() {
        let data = Data::from(serde_json::json!({ "name": "leo", "posts": [{ "id": 1 }] }));
        assert_eq!(data.member("name"), Some(&Data::from("leo")));
        let posts = data.member("posts").and_then(Data::as_list).unwrap();
        assert_eq!(posts.len(), 1);
        assert!(data.member("missing").is_none());
    }
}

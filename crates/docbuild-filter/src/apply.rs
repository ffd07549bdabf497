/*
 * apply.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Applying filters to documents and sequences.

use crate::ast::{Filter, FilterField, FilterFunction};
use docbuild_document::{Document, Value};

impl Filter {
    /// Apply the functions declared for `field_name` to `value`.
    ///
    /// Functions only act on arrays; any other value is returned unchanged,
    /// as is every value when no filter exists for `field_name`.
    pub fn apply_functions(&self, value: Value, field_name: &str) -> Value {
        match (self.get_filter(field_name), value) {
            (Some(field), Value::Array(items)) => {
                Value::Array(field.apply_to_items(items, |item, key| sort_key_of(item, key)))
            }
            (_, value) => value,
        }
    }

    /// Keep only the selected fields of `doc`, recursively.
    ///
    /// Selected fields have their functions applied, and their nested filter
    /// (if any) is applied to the nested document or to each document in a
    /// nested array. An empty filter selects everything.
    pub fn prune(&self, doc: &Document) -> Document {
        if self.is_empty() {
            return doc.clone();
        }

        let mut pruned = Document::new();
        for (key, value) in doc {
            let Some(field) = self.get_filter(key) else {
                continue;
            };
            let value = self.apply_functions(value.clone(), key);
            let value = match &field.nested {
                Some(nested) if !nested.is_empty() => nested.prune_value(value),
                _ => value,
            };
            pruned.insert(key.clone(), value);
        }
        pruned
    }

    fn prune_value(&self, value: Value) -> Value {
        match value {
            Value::Document(doc) => Value::Document(self.prune(&doc)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.prune_value(item)).collect())
            }
            other => other,
        }
    }
}

impl FilterField {
    /// Apply this field's functions, in declared order, to a sequence of
    /// items.
    ///
    /// `sort_key` extracts the value to sort by from an item; it receives
    /// `None` when `sort()` was called without a key.
    pub fn apply_to_items<T>(
        &self,
        mut items: Vec<T>,
        sort_key: impl Fn(&T, Option<&str>) -> Value,
    ) -> Vec<T> {
        for call in &self.functions {
            match call.function {
                FilterFunction::Limit => {
                    if let Some(limit) = call.args.first().and_then(|n| n.parse::<usize>().ok()) {
                        items.truncate(limit);
                    }
                }
                FilterFunction::Sort => {
                    let key = call.args.first().map(String::as_str);
                    let descending = call.args.get(1).is_some_and(|dir| dir == "desc");
                    let mut keyed: Vec<(Value, T)> = items
                        .into_iter()
                        .map(|item| (sort_key(&item, key), item))
                        .collect();
                    keyed.sort_by(|(a, _), (b, _)| {
                        let ordering = a.sort_cmp(b);
                        if descending { ordering.reverse() } else { ordering }
                    });
                    items = keyed.into_iter().map(|(_, item)| item).collect();
                }
            }
        }
        items
    }
}

fn sort_key_of(item: &Value, key: Option<&str>) -> Value {
    match (item, key) {
        (Value::Document(doc), Some(key)) => doc.get(key).cloned().unwrap_or_default(),
        (_, None) => item.clone(),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Value::from(value).into_document().unwrap()
    }

    #[test]
    fn test_limit_truncates() {
        let filter = Filter::parse("tags.limit(2)");
        let value = Value::from(json!(["a", "b", "c"]));
        assert_eq!(filter.apply_functions(value, "tags"), Value::from(json!(["a", "b"])));
    }

    #[test]
    fn test_limit_larger_than_sequence() {
        let filter = Filter::parse("tags.limit(10)");
        let value = Value::from(json!(["a"]));
        assert_eq!(filter.apply_functions(value, "tags"), Value::from(json!(["a"])));
    }

    #[test]
    fn test_sort_by_key() {
        let filter = Filter::parse("posts.sort(title)");
        let value = Value::from(json!([
            { "title": "c" },
            { "title": "a" },
            { "title": "b" }
        ]));
        let sorted = filter.apply_functions(value, "posts");
        assert_eq!(
            sorted,
            Value::from(json!([{ "title": "a" }, { "title": "b" }, { "title": "c" }]))
        );
    }

    #[test]
    fn test_sort_without_key_then_limit() {
        let filter = Filter::parse("scores.sort().limit(2)");
        let value = Value::from(json!([3, 1, 2]));
        assert_eq!(filter.apply_functions(value, "scores"), Value::from(json!([1, 2])));
    }

    #[test]
    fn test_sort_is_stable() {
        let filter = Filter::parse("people.sort(age, desc)");
        let value = Value::from(json!([
            { "name": "a", "age": 1 },
            { "name": "b", "age": 2 },
            { "name": "c", "age": 2 }
        ]));
        let sorted = filter.apply_functions(value, "people");
        assert_eq!(
            sorted,
            Value::from(json!([
                { "name": "b", "age": 2 },
                { "name": "c", "age": 2 },
                { "name": "a", "age": 1 }
            ]))
        );
    }

    #[test]
    fn test_functions_ignore_scalars() {
        let filter = Filter::parse("name.limit(1)");
        assert_eq!(filter.apply_functions(Value::from("leo"), "name"), Value::from("leo"));
        assert_eq!(
            filter.apply_functions(Value::from(json!([1, 2])), "other"),
            Value::from(json!([1, 2]))
        );
    }

    #[test]
    fn test_prune_nested() {
        let filter = Filter::parse("user{name,posts.limit(1){title}}");
        let input = doc(json!({
            "id": 7,
            "user": {
                "name": "leo",
                "email": "leo@example.com",
                "posts": [
                    { "title": "one", "body": "..." },
                    { "title": "two", "body": "..." }
                ]
            }
        }));

        let pruned = filter.prune(&input);
        assert_eq!(
            serde_json::to_value(&pruned).unwrap(),
            json!({ "user": { "name": "leo", "posts": [{ "title": "one" }] } })
        );
    }

    #[test]
    fn test_prune_without_nested_keeps_subtree() {
        let filter = Filter::parse("user");
        let input = doc(json!({ "user": { "name": "leo", "age": 12 }, "id": 1 }));
        assert_eq!(
            serde_json::to_value(filter.prune(&input)).unwrap(),
            json!({ "user": { "name": "leo", "age": 12 } })
        );
    }

    #[test]
    fn test_empty_filter_selects_everything() {
        let input = doc(json!({ "a": 1, "b": 2 }));
        assert_eq!(Filter::parse("").prune(&input), input);
    }
}

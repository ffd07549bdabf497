/*
 * nil.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Nil-handling transforms.
//!
//! A built document passes through exactly one [`NilPolicy`] before it is
//! handed to a codec. Every policy is idempotent.

use crate::document::Document;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// How null and empty-string leaves are treated in a finished document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NilPolicy {
    /// Leave the document untouched.
    #[default]
    None,

    /// Replace every null leaf with the empty string.
    BlankToEmpty,

    /// Replace every empty-string leaf with null.
    EmptyToNil,

    /// Remove every null-valued key, recursively.
    DropNil,
}

impl NilPolicy {
    /// Apply the policy to a document in place.
    pub fn apply(self, doc: &mut Document) {
        match self {
            NilPolicy::None => {}
            NilPolicy::DropNil => drop_nil(doc),
            NilPolicy::BlankToEmpty | NilPolicy::EmptyToNil => {
                for value in doc.values_mut() {
                    self.apply_value(value);
                }
            }
        }
    }

    /// Apply the policy to any value in place.
    pub fn apply_value(self, value: &mut Value) {
        if self == NilPolicy::None {
            return;
        }
        match value {
            Value::Document(doc) => self.apply(doc),
            Value::Array(items) => {
                for item in items {
                    self.apply_value(item);
                }
            }
            Value::Null if self == NilPolicy::BlankToEmpty => {
                *value = Value::String(String::new());
            }
            Value::String(s) if s.is_empty() && self == NilPolicy::EmptyToNil => {
                *value = Value::Null;
            }
            _ => {}
        }
    }
}

fn drop_nil(doc: &mut Document) {
    doc.retain(|_, value| !value.is_null());
    for value in doc.values_mut() {
        NilPolicy::DropNil.apply_value(value);
    }
}

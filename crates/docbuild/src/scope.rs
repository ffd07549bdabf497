/*
 * scope.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The calling scope of a build.
//!
//! Templates may refer to names that are not members of the object being
//! built: variables such as `@posts`, or helpers backing computed nodes. A
//! [`Scope`] is the only way the builder reaches outside the data it was
//! given.

use crate::data::Data;
use docbuild_document::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A helper that computes a value from the current object.
pub type HelperFn = Arc<dyn Fn(&Data) -> Value + Send + Sync>;

/// Lookup operations the builder needs from its caller.
pub trait Scope {
    /// Look up a named variable.
    fn lookup(&self, name: &str) -> Option<&Data>;

    /// Invoke a named helper with the current object.
    ///
    /// Returns `None` if no helper with that name exists.
    fn call(&self, helper: &str, object: &Data) -> Option<Value>;
}

/// A scope with no variables and no helpers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, _name: &str) -> Option<&Data> {
        None
    }

    fn call(&self, _helper: &str, _object: &Data) -> Option<Value> {
        None
    }
}

/// A scope backed by in-memory maps.
#[derive(Clone, Default)]
pub struct MapScope {
    variables: HashMap<String, Data>,
    helpers: HashMap<String, HelperFn>,
}

impl MapScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Data>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Register a helper.
    pub fn helper(
        mut self,
        name: impl Into<String>,
        helper: impl Fn(&Data) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.helpers.insert(name.into(), Arc::new(helper));
        self
    }
}

impl Scope for MapScope {
    fn lookup(&self, name: &str) -> Option<&Data> {
        self.variables.get(name)
    }

    fn call(&self, helper: &str, object: &Data) -> Option<Value> {
        self.helpers.get(helper).map(|helper| helper(object))
    }
}

impl fmt::Debug for MapScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut helpers: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        helpers.sort_unstable();
        f.debug_struct("MapScope")
            .field("variables", &self.variables)
            .field("helpers", &helpers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;

    #[test]
    fn test_map_scope() {
        let scope = MapScope::new()
            .variable("posts", vec!["a", "b"])
            .helper("shout", |object| {
                let name = object.member("name").and_then(Data::as_str).unwrap_or("");
                Value::from(name.to_uppercase())
            });

        assert!(scope.lookup("posts").is_some());
        assert!(scope.lookup("missing").is_none());

        let leo = Data::Record(Record::new("user").with_field("name", "leo"));
        assert_eq!(scope.call("shout", &leo), Some(Value::from("LEO")));
        assert_eq!(scope.call("whisper", &leo), None);
    }

    #[test]
    fn test_empty_scope() {
        assert!(EmptyScope.lookup("anything").is_none());
        assert!(EmptyScope.call("anything", &Data::Null).is_none());
    }
}

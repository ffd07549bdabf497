/*
 * directive.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template directives.
//!
//! A template is an ordered list of [`Directive`]s. Attributes project
//! members of the current object, nodes compute arbitrary values, and
//! child/glue/extends run nested builds whose results are merged in a fixed
//! phase order (see [`crate::builder`]).

use crate::config::RootSetting;
use crate::data::Data;
use crate::scope::Scope;
use crate::template::Template;
use docbuild_document::{Document, Value};
use std::fmt;
use std::sync::Arc;

/// Predicate used by [`Condition::Predicate`].
pub type PredicateFn = Arc<dyn Fn(&Data) -> bool + Send + Sync>;

/// Function used by [`Compute::Func`].
pub type NodeFn = Arc<dyn Fn(&NodeContext<'_>) -> Value + Send + Sync>;

/// Identifies the data a child, glue or extends directive builds against.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// The object currently being built.
    Current,

    /// A member of the current object. Falls back to a scope variable of
    /// the same name.
    Member(String),

    /// A scope variable.
    Variable(String),

    /// A literal value.
    Value(Data),

    /// Another selector with an explicit output name.
    Named(Box<Selector>, String),
}

impl Selector {
    pub fn current() -> Self {
        Selector::Current
    }

    pub fn member(name: impl Into<String>) -> Self {
        Selector::Member(name.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Selector::Variable(name.into())
    }

    pub fn value(data: impl Into<Data>) -> Self {
        Selector::Value(data.into())
    }

    /// Give this selector an explicit output name.
    pub fn named(self, name: impl Into<String>) -> Self {
        match self {
            // Renaming a named selector replaces the name.
            Selector::Named(inner, _) => Selector::Named(inner, name.into()),
            other => Selector::Named(Box::new(other), name.into()),
        }
    }

    /// The explicit output name, if any.
    pub fn override_name(&self) -> Option<&str> {
        match self {
            Selector::Named(_, name) => Some(name),
            _ => None,
        }
    }

    /// The symbolic token naming this selector (`posts` for both
    /// `Member("posts")` and `Variable("posts")`).
    pub fn token(&self) -> Option<&str> {
        match self {
            Selector::Member(name) | Selector::Variable(name) => Some(name),
            Selector::Named(inner, _) => inner.token(),
            Selector::Current | Selector::Value(_) => None,
        }
    }
}

/// A condition gating a directive.
#[derive(Clone)]
pub enum Condition {
    /// A literal outcome.
    Always(bool),

    /// A callable invoked with the current object.
    Predicate(PredicateFn),

    /// A member of the current object whose truthiness decides. Falls back
    /// to a scope variable of the same name; a missing name is false.
    MemberName(String),
}

impl Condition {
    pub fn predicate(f: impl Fn(&Data) -> bool + Send + Sync + 'static) -> Self {
        Condition::Predicate(Arc::new(f))
    }

    pub fn member(name: impl Into<String>) -> Self {
        Condition::MemberName(name.into())
    }

    pub fn evaluate(&self, object: &Data, scope: &dyn Scope) -> bool {
        match self {
            Condition::Always(outcome) => *outcome,
            Condition::Predicate(predicate) => predicate(object),
            Condition::MemberName(name) => object
                .member(name)
                .or_else(|| scope.lookup(name))
                .is_some_and(Data::is_truthy),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always(outcome) => f.debug_tuple("Always").field(outcome).finish(),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
            Condition::MemberName(name) => f.debug_tuple("MemberName").field(name).finish(),
        }
    }
}

/// The `if`/`unless` pair attached to a directive.
///
/// With neither set the guard always passes. With both set, both must
/// agree.
#[derive(Debug, Clone, Default)]
pub struct Guard {
    pub when: Option<Condition>,
    pub unless: Option<Condition>,
}

impl Guard {
    pub fn when(condition: Condition) -> Self {
        Self {
            when: Some(condition),
            unless: None,
        }
    }

    pub fn unless(condition: Condition) -> Self {
        Self {
            when: None,
            unless: Some(condition),
        }
    }

    pub fn passes(&self, object: &Data, scope: &dyn Scope) -> bool {
        let when = self
            .when
            .as_ref()
            .is_none_or(|condition| condition.evaluate(object, scope));
        let unless = self
            .unless
            .as_ref()
            .is_none_or(|condition| !condition.evaluate(object, scope));
        when && unless
    }

    fn fingerprint(&self) -> String {
        let part = |condition: &Option<Condition>| match condition {
            None => "-".to_string(),
            Some(Condition::Always(outcome)) => outcome.to_string(),
            Some(Condition::Predicate(predicate)) => format!("fn@{:p}", Arc::as_ptr(predicate)),
            Some(Condition::MemberName(name)) => format!(":{name}"),
        };
        format!("if={};unless={}", part(&self.when), part(&self.unless))
    }
}

/// What a node evaluates to produce its value.
#[derive(Clone)]
pub enum Compute {
    /// A closure receiving the node context.
    Func(NodeFn),

    /// A scope helper invoked with the current object.
    Helper(String),

    /// A literal value.
    Value(Value),
}

impl fmt::Debug for Compute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compute::Func(_) => f.write_str("Func(..)"),
            Compute::Helper(name) => f.debug_tuple("Helper").field(name).finish(),
            Compute::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// What a node function can see.
pub struct NodeContext<'a> {
    pub(crate) object: &'a Data,
    pub(crate) document: &'a Document,
    pub(crate) scope: &'a dyn Scope,
}

impl<'a> NodeContext<'a> {
    /// The object being built.
    pub fn object(&self) -> &'a Data {
        self.object
    }

    /// Everything merged so far: attributes, extends, children and glue,
    /// plus nodes declared earlier.
    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn scope(&self) -> &'a dyn Scope {
        self.scope
    }

    /// Shorthand for a member of the current object.
    pub fn member(&self, name: &str) -> Option<&'a Data> {
        self.object.member(name)
    }
}

/// Project a member of the current object.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub alias: Option<String>,
    pub guard: Guard,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            guard: Guard::default(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    /// The output key: the alias if given, else the member name.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Compute an arbitrary value.
#[derive(Debug, Clone)]
pub struct Node {
    /// Output key. Unnamed nodes returning a document merge it at the root.
    pub name: Option<String>,
    pub guard: Guard,
    pub compute: Compute,
}

/// Embed a nested build under a name.
#[derive(Debug, Clone)]
pub struct Child {
    pub selector: Selector,

    /// Per-element root wrapping for collection children. Overrides the
    /// configured child root inclusion.
    pub object_root: Option<RootSetting>,
    pub guard: Guard,
    pub template: Template,
}

/// Merge a nested build's fields into the current document.
#[derive(Debug, Clone)]
pub struct Glue {
    pub selector: Selector,
    pub guard: Guard,
    pub template: Template,
}

/// Evaluate another template (plus extra directives) and merge the result.
#[derive(Debug, Clone)]
pub struct Extends {
    /// Name of the template, resolved through the template source.
    pub template: String,

    /// Data to build against. Defaults to the current object.
    pub object: Option<Selector>,
    pub guard: Guard,

    /// Directives evaluated after the extended template's own.
    pub extra: Template,
}

/// One template instruction.
#[derive(Debug, Clone)]
pub enum Directive {
    Attribute(Attribute),
    Node(Node),
    Child(Child),
    Glue(Glue),
    Extends(Extends),
}

impl Directive {
    pub fn kind(&self) -> &'static str {
        match self {
            Directive::Attribute(_) => "attribute",
            Directive::Node(_) => "node",
            Directive::Child(_) => "child",
            Directive::Glue(_) => "glue",
            Directive::Extends(_) => "extends",
        }
    }

    /// A stable textual description, used to digest programmatic templates.
    pub(crate) fn fingerprint(&self) -> String {
        match self {
            Directive::Attribute(a) => format!(
                "attribute({}=>{};{})",
                a.name,
                a.key(),
                a.guard.fingerprint()
            ),
            Directive::Node(n) => {
                let compute = match &n.compute {
                    Compute::Func(f) => format!("fn@{:p}", Arc::as_ptr(f)),
                    Compute::Helper(name) => format!("helper:{name}"),
                    Compute::Value(value) => format!("value:{value:?}"),
                };
                format!(
                    "node({};{compute};{})",
                    n.name.as_deref().unwrap_or("-"),
                    n.guard.fingerprint()
                )
            }
            Directive::Child(c) => format!(
                "child({:?};{:?};{})[{}]",
                c.selector,
                c.object_root,
                c.guard.fingerprint(),
                c.template.digest()
            ),
            Directive::Glue(g) => format!(
                "glue({:?};{})[{}]",
                g.selector,
                g.guard.fingerprint(),
                g.template.digest()
            ),
            Directive::Extends(e) => format!(
                "extends({};{:?};{})[{}]",
                e.template,
                e.object,
                e.guard.fingerprint(),
                e.extra.digest()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::scope::{EmptyScope, MapScope};

    fn leo() -> Data {
        Data::Record(
            Record::new("user")
                .with_field("name", "leo")
                .with_field("admin", false)
                .with_field("active", true),
        )
    }

    #[test]
    fn test_condition_forms() {
        let scope = EmptyScope;
        assert!(Condition::Always(true).evaluate(&leo(), &scope));
        assert!(!Condition::Always(false).evaluate(&leo(), &scope));
        assert!(Condition::member("active").evaluate(&leo(), &scope));
        assert!(!Condition::member("admin").evaluate(&leo(), &scope));
        assert!(!Condition::member("missing").evaluate(&leo(), &scope));

        let named_leo = Condition::predicate(|object| object.member("name") == Some(&Data::from("leo")));
        assert!(named_leo.evaluate(&leo(), &scope));
    }

    #[test]
    fn test_member_condition_falls_back_to_scope() {
        let scope = MapScope::new().variable("feature_on", true);
        assert!(Condition::member("feature_on").evaluate(&leo(), &scope));
    }

    #[test]
    fn test_guard() {
        let scope = EmptyScope;
        assert!(Guard::default().passes(&leo(), &scope));
        assert!(Guard::when(Condition::member("active")).passes(&leo(), &scope));
        assert!(!Guard::unless(Condition::member("active")).passes(&leo(), &scope));
        assert!(Guard::unless(Condition::member("admin")).passes(&leo(), &scope));

        let both = Guard {
            when: Some(Condition::member("active")),
            unless: Some(Condition::Always(true)),
        };
        assert!(!both.passes(&leo(), &scope));
    }

    #[test]
    fn test_selector_names() {
        let selector = Selector::member("posts").named("articles");
        assert_eq!(selector.override_name(), Some("articles"));
        assert_eq!(selector.token(), Some("posts"));

        let renamed = selector.named("entries");
        assert_eq!(renamed.override_name(), Some("entries"));
        assert_eq!(Selector::current().token(), None);
    }

    #[test]
    fn test_attribute_key() {
        assert_eq!(Attribute::new("name").key(), "name");
        assert_eq!(Attribute::new("name").alias("city").key(), "city");
    }
}

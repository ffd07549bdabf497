/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Templates: ordered directive lists with a stable digest.

use crate::config::RootSetting;
use crate::directive::{
    Attribute, Child, Compute, Directive, Extends, Glue, Guard, Node, NodeContext, Selector,
};
use docbuild_document::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// A compiled template.
///
/// The digest identifies the template in cache keys. Templates compiled
/// from source text digest the text; templates assembled in code digest a
/// structural description of their directives.
#[derive(Debug, Clone)]
pub struct Template {
    name: Option<String>,
    directives: Vec<Directive>,
    digest: String,
}

impl Default for Template {
    fn default() -> Self {
        Template::new(Vec::new())
    }
}

impl Template {
    /// Create a template from directives, digesting their structure.
    pub fn new(directives: Vec<Directive>) -> Self {
        let fingerprint: Vec<String> = directives.iter().map(Directive::fingerprint).collect();
        let digest = sha256_hash(&fingerprint.join("\n"));
        Self {
            name: None,
            directives,
            digest,
        }
    }

    /// Create a template compiled from `source`, digesting the source text.
    pub fn from_source(name: Option<String>, source: &str, directives: Vec<Directive>) -> Self {
        Self {
            name,
            directives,
            digest: sha256_hash(source),
        }
    }

    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the digest, e.g. with a version string for templates whose
    /// closures should not affect cache keys.
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = digest.into();
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Append `extra`'s directives to this template's.
    ///
    /// The result digests both parts.
    pub fn extended_with(&self, extra: &Template) -> Template {
        if extra.is_empty() {
            return self.clone();
        }
        let mut directives = self.directives.clone();
        directives.extend(extra.directives.iter().cloned());
        Template {
            name: self.name.clone(),
            directives,
            digest: sha256_hash(&format!("{}+{}", self.digest, extra.digest)),
        }
    }
}

pub(crate) fn sha256_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("sha256:{:x}", digest)
}

/// Fluent construction of templates in code.
///
/// ```
/// use docbuild::{Selector, Template};
/// use docbuild::Value;
///
/// let template = Template::builder()
///     .attribute("name")
///     .child(Selector::current().named("person"), |t| t.attribute("city"))
///     .node("age", |_| Value::from(12))
///     .build();
/// assert_eq!(template.directives().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    directives: Vec<Directive>,
}

impl TemplateBuilder {
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn attribute(self, name: impl Into<String>) -> Self {
        self.directive(Directive::Attribute(Attribute::new(name)))
    }

    pub fn attribute_as(self, name: impl Into<String>, alias: impl Into<String>) -> Self {
        self.directive(Directive::Attribute(Attribute::new(name).alias(alias)))
    }

    pub fn attributes<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |builder, name| builder.attribute(name))
    }

    pub fn attribute_with(self, attribute: Attribute) -> Self {
        self.directive(Directive::Attribute(attribute))
    }

    /// A named node computed by `f`.
    pub fn node(
        self,
        name: impl Into<String>,
        f: impl Fn(&NodeContext<'_>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.node_with(Some(name.into()), Guard::default(), f)
    }

    /// An unnamed node; a document result merges at the root.
    pub fn merged_node(self, f: impl Fn(&NodeContext<'_>) -> Value + Send + Sync + 'static) -> Self {
        self.node_with(None, Guard::default(), f)
    }

    pub fn node_with(
        self,
        name: Option<String>,
        guard: Guard,
        f: impl Fn(&NodeContext<'_>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.directive(Directive::Node(Node {
            name,
            guard,
            compute: Compute::Func(Arc::new(f)),
        }))
    }

    /// A named node computed by a scope helper.
    pub fn helper_node(self, name: impl Into<String>, helper: impl Into<String>) -> Self {
        self.directive(Directive::Node(Node {
            name: Some(name.into()),
            guard: Guard::default(),
            compute: Compute::Helper(helper.into()),
        }))
    }

    pub fn child(
        self,
        selector: Selector,
        body: impl FnOnce(TemplateBuilder) -> TemplateBuilder,
    ) -> Self {
        self.child_with(selector, None, Guard::default(), body)
    }

    pub fn child_with(
        self,
        selector: Selector,
        object_root: Option<RootSetting>,
        guard: Guard,
        body: impl FnOnce(TemplateBuilder) -> TemplateBuilder,
    ) -> Self {
        let template = body(TemplateBuilder::default()).build();
        self.directive(Directive::Child(Child {
            selector,
            object_root,
            guard,
            template,
        }))
    }

    pub fn glue(
        self,
        selector: Selector,
        body: impl FnOnce(TemplateBuilder) -> TemplateBuilder,
    ) -> Self {
        self.glue_with(selector, Guard::default(), body)
    }

    pub fn glue_with(
        self,
        selector: Selector,
        guard: Guard,
        body: impl FnOnce(TemplateBuilder) -> TemplateBuilder,
    ) -> Self {
        let template = body(TemplateBuilder::default()).build();
        self.directive(Directive::Glue(Glue {
            selector,
            guard,
            template,
        }))
    }

    pub fn extends(self, template: impl Into<String>) -> Self {
        self.extends_with(template, None, Guard::default(), |t| t)
    }

    pub fn extends_with(
        self,
        template: impl Into<String>,
        object: Option<Selector>,
        guard: Guard,
        extra: impl FnOnce(TemplateBuilder) -> TemplateBuilder,
    ) -> Self {
        let extra = extra(TemplateBuilder::default()).build();
        self.directive(Directive::Extends(Extends {
            template: template.into(),
            object,
            guard,
            extra,
        }))
    }

    pub fn build(self) -> Template {
        Template::new(self.directives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order() {
        let template = Template::builder()
            .attributes(["id", "name"])
            .glue(Selector::current(), |t| t.attribute("city"))
            .extends("users/base")
            .helper_node("full_name", "full_name")
            .build();

        let kinds: Vec<&str> = template.directives().iter().map(Directive::kind).collect();
        assert_eq!(kinds, vec!["attribute", "attribute", "glue", "extends", "node"]);
    }

    #[test]
    fn test_digest_is_structural() {
        let a = Template::builder().attribute("name").build();
        let b = Template::builder().attribute("name").build();
        let c = Template::builder().attribute_as("name", "city").build();

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert!(a.digest().starts_with("sha256:"));
    }

    #[test]
    fn test_source_digest() {
        let a = Template::from_source(None, "- attribute: name\n", Vec::new());
        let b = Template::from_source(None, "- attribute: city\n", Vec::new());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_extended_with() {
        let base = Template::builder().attribute("id").build();
        let extra = Template::builder().attribute("name").build();
        let combined = base.extended_with(&extra);

        assert_eq!(combined.directives().len(), 2);
        assert_ne!(combined.digest(), base.digest());
        assert_eq!(base.extended_with(&Template::default()).digest(), base.digest());
    }
}

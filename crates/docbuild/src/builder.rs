/*
 * builder.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document builder.
//!
//! Evaluates one template against one object. Directives contribute to the
//! document in a fixed phase order, independent of where they appear in the
//! template:
//!
//! 1. Attributes are written as they are encountered.
//! 2. `extends` results are merged.
//! 3. Children are stored under their names (overriding same-named keys
//!    from `extends`).
//! 4. Glue results are merged.
//! 5. Nodes run last, see everything merged so far, and win.
//!
//! The configured nil policy is then applied, and the result is wrapped in
//! its root name when one applies.

use crate::batch::BatchBuilder;
use crate::cache::{CacheOptions, fetch};
use crate::codec::Format;
use crate::config::RootSetting;
use crate::context::BuildContext;
use crate::data::Data;
use crate::directive::{Attribute, Child, Compute, Directive, Extends, Glue, Node, NodeContext};
use crate::error::{BuildError, BuildResult};
use crate::resolver::{NameHints, derive_name, is_collection, resolve_selector_value};
use crate::template::Template;
use docbuild_document::{Document, Value};
use docbuild_filter::{Filter, FilterField};

/// Per-call options for top-level builds.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Output format, recorded in cache keys.
    pub format: Format,

    /// Root wrapping for the result. Overrides the configured
    /// `include_root`.
    pub root: Option<RootSetting>,

    /// Root wrapping for each element when the object is a collection.
    /// Top-level elements are not wrapped unless this is set.
    pub object_root: Option<RootSetting>,

    /// Field selection applied while building.
    pub filter: Option<Filter>,

    /// Passed to the cache on every write.
    pub cache: CacheOptions,
}

impl BuildOptions {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_root(mut self, root: impl Into<RootSetting>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_object_root(mut self, root: impl Into<RootSetting>) -> Self {
        self.object_root = Some(root.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_cache_options(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    /// The filter, if one is set and selects anything.
    pub(crate) fn active_filter(&self) -> Option<&Filter> {
        self.filter.as_ref().filter(|filter| !filter.is_empty())
    }
}

/// A deferred contribution from a child, glue or extends directive.
#[derive(Debug, Clone, PartialEq)]
enum PendingContribution {
    /// Stored under a key of the parent document.
    Named(String, Value),

    /// Merged key-by-key into the parent document.
    Merged(Document),
}

impl PendingContribution {
    fn apply(self, doc: &mut Document) {
        match self {
            PendingContribution::Named(name, value) => {
                doc.insert(name, value);
            }
            PendingContribution::Merged(other) => doc.merge(other),
        }
    }
}

/// Evaluates templates against single objects.
#[derive(Clone, Copy)]
pub struct DocumentBuilder<'a> {
    ctx: BuildContext<'a>,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(ctx: BuildContext<'a>) -> Self {
        Self { ctx }
    }

    /// Build `object` with `template`.
    ///
    /// Collections produce an array with one entry per element (see
    /// [`BatchBuilder`]); single objects produce a document. The result is
    /// wrapped in a root name when root inclusion applies. A null object
    /// builds to null.
    pub fn build(&self, object: &Data, template: &Template, options: &BuildOptions) -> BuildResult<Value> {
        let include_root = options
            .root
            .as_ref()
            .unwrap_or(&self.ctx.config.include_root);
        let filter = options.active_filter();

        match object {
            Data::Null => Ok(Value::Null),
            Data::List(list) => {
                let name = derive_name(None, object, NameHints::default());
                let root = root_name(include_root, name.as_deref());
                let field = filter.zip(root.as_deref()).and_then(|(f, root)| f.get_filter(root));
                let items = select_items(list.items().to_vec(), field);

                let element_root = options
                    .object_root
                    .clone()
                    .unwrap_or(RootSetting::Enabled(false));
                let values = BatchBuilder::new(self.ctx).build_items(
                    &items,
                    template,
                    &element_root,
                    name.as_deref(),
                    0,
                    scoped(filter, root.as_deref()),
                    options,
                )?;
                let array = Value::Array(values);
                Ok(match root {
                    Some(root) => Value::Document(Document::single(root, array)),
                    None => array,
                })
            }
            _ => {
                let name = derive_name(None, object, NameHints::default());
                let root = root_name(include_root, name.as_deref());
                self.build_object(
                    object,
                    template,
                    root.as_deref(),
                    0,
                    scoped(filter, root.as_deref()),
                    options,
                )
            }
        }
    }

    /// Evaluate `template` against `object` without caching or root
    /// wrapping.
    pub fn build_document(&self, object: &Data, template: &Template) -> BuildResult<Document> {
        self.evaluate(object, template, 0, None, &BuildOptions::default())
    }

    /// Build a single object, wrapped under `root` when given, through the
    /// result cache when caching applies.
    pub(crate) fn build_object(
        &self,
        object: &Data,
        template: &Template,
        root: Option<&str>,
        depth: usize,
        filter: Option<&Filter>,
        options: &BuildOptions,
    ) -> BuildResult<Value> {
        let key = self
            .ctx
            .cache_key(object, root, options.format, template, filter);
        match (self.ctx.active_cache(), key) {
            (Some(cache), Some(key)) => fetch(cache, &key, &options.cache, || {
                self.build_uncached(object, template, root, depth, filter, options)
            }),
            _ => self.build_uncached(object, template, root, depth, filter, options),
        }
    }

    pub(crate) fn build_uncached(
        &self,
        object: &Data,
        template: &Template,
        root: Option<&str>,
        depth: usize,
        filter: Option<&Filter>,
        options: &BuildOptions,
    ) -> BuildResult<Value> {
        let doc = self.evaluate(object, template, depth, filter, options)?;
        Ok(Value::Document(match root {
            Some(root) => doc.wrap(root),
            None => doc,
        }))
    }

    /// Evaluate every directive of `template` against `object`.
    fn evaluate(
        &self,
        object: &Data,
        template: &Template,
        depth: usize,
        filter: Option<&Filter>,
        options: &BuildOptions,
    ) -> BuildResult<Document> {
        let max_depth = self.ctx.config.max_depth;
        if depth > max_depth {
            return Err(BuildError::TemplateCycle {
                name: template.name().unwrap_or("<inline>").to_string(),
                depth,
                max_depth,
            });
        }

        let mut doc = Document::new();
        let mut extended = Vec::new();
        let mut children = Vec::new();
        let mut glued = Vec::new();
        let mut nodes = Vec::new();

        for directive in template.directives() {
            match directive {
                Directive::Attribute(attribute) => {
                    self.attribute(&mut doc, object, attribute, filter)?;
                }
                Directive::Extends(extends) => {
                    if let Some(pending) = self.extends(object, extends, depth, filter, options)? {
                        extended.push(pending);
                    }
                }
                Directive::Child(child) => {
                    if let Some(pending) = self.child(object, child, depth, filter, options)? {
                        children.push(pending);
                    }
                }
                Directive::Glue(glue) => {
                    if let Some(pending) = self.glue(object, glue, depth, filter, options)? {
                        glued.push(pending);
                    }
                }
                Directive::Node(node) => nodes.push(node),
            }
        }

        for pending in extended.into_iter().chain(children).chain(glued) {
            pending.apply(&mut doc);
        }
        for node in nodes {
            self.node(&mut doc, object, node, filter)?;
        }

        self.ctx.config.nil_policy.apply(&mut doc);
        Ok(doc)
    }

    fn attribute(
        &self,
        doc: &mut Document,
        object: &Data,
        attribute: &Attribute,
        filter: Option<&Filter>,
    ) -> BuildResult<()> {
        if !attribute.guard.passes(object, self.ctx.scope) {
            return Ok(());
        }
        let key = attribute.key();
        if filter.is_some_and(|filter| !filter.has_filter_for(key)) {
            return Ok(());
        }
        match object.member(&attribute.name) {
            Some(value) => {
                let value = match filter {
                    Some(filter) => filter.apply_functions(value.to_value(), key),
                    None => value.to_value(),
                };
                doc.insert(key, value);
            }
            None if self.ctx.config.raise_on_missing_attribute => {
                return Err(BuildError::MissingAttribute {
                    name: attribute.name.clone(),
                });
            }
            None => {
                tracing::trace!(attribute = %attribute.name, "attribute absent, skipped");
            }
        }
        Ok(())
    }

    fn extends(
        &self,
        object: &Data,
        extends: &Extends,
        depth: usize,
        filter: Option<&Filter>,
        options: &BuildOptions,
    ) -> BuildResult<Option<PendingContribution>> {
        if !extends.guard.passes(object, self.ctx.scope) {
            return Ok(None);
        }
        let target = match &extends.object {
            Some(selector) => resolve_selector_value(selector, object, self.ctx.scope),
            None => Some(object),
        };
        let Some(target) = target.filter(|data| !data.is_blank()) else {
            tracing::trace!(template = %extends.template, "extends target absent, skipped");
            return Ok(None);
        };
        if is_collection(target) {
            tracing::trace!(template = %extends.template, "extends target is a collection, skipped");
            return Ok(None);
        }

        let base = self.ctx.template(&extends.template)?;
        let template = base.extended_with(&extends.extra);
        let doc = self.evaluate(target, &template, depth + 1, filter, options)?;
        Ok(Some(PendingContribution::Merged(doc)))
    }

    fn child(
        &self,
        object: &Data,
        child: &Child,
        depth: usize,
        filter: Option<&Filter>,
        options: &BuildOptions,
    ) -> BuildResult<Option<PendingContribution>> {
        if !child.guard.passes(object, self.ctx.scope) {
            return Ok(None);
        }
        let Some(value) = resolve_selector_value(&child.selector, object, self.ctx.scope)
            .filter(|data| !data.is_blank())
        else {
            tracing::trace!(selector = ?child.selector, "child data absent, skipped");
            return Ok(None);
        };
        let Some(name) = derive_name(Some(&child.selector), value, NameHints::default()) else {
            tracing::trace!(selector = ?child.selector, "child has no name, skipped");
            return Ok(None);
        };

        let (field, nested) = match filter {
            Some(filter) if !filter.has_filter_for(&name) => return Ok(None),
            Some(filter) => (filter.get_filter(&name), filter.nested_for(&name)),
            None => (None, None),
        };

        let built = match value {
            Data::List(list) => {
                let items = select_items(list.items().to_vec(), field);
                let element_root = child
                    .object_root
                    .clone()
                    .unwrap_or(RootSetting::Enabled(self.ctx.config.include_child_root));
                let values = BatchBuilder::new(self.ctx).build_items(
                    &items,
                    &child.template,
                    &element_root,
                    Some(&name),
                    depth + 1,
                    nested,
                    options,
                )?;
                Value::Array(values)
            }
            _ => self.build_object(value, &child.template, None, depth + 1, nested, options)?,
        };
        Ok(Some(PendingContribution::Named(name, built)))
    }

    fn glue(
        &self,
        object: &Data,
        glue: &Glue,
        depth: usize,
        filter: Option<&Filter>,
        options: &BuildOptions,
    ) -> BuildResult<Option<PendingContribution>> {
        if !glue.guard.passes(object, self.ctx.scope) {
            return Ok(None);
        }
        let Some(value) = resolve_selector_value(&glue.selector, object, self.ctx.scope)
            .filter(|data| !data.is_blank())
        else {
            return Ok(None);
        };
        // Only documents can be merged.
        if is_collection(value) {
            tracing::trace!(selector = ?glue.selector, "glue data is a collection, dropped");
            return Ok(None);
        }

        // A selector name only picks the data; glue never adds a level.
        let doc = self.evaluate(value, &glue.template, depth + 1, filter, options)?;
        Ok(Some(PendingContribution::Merged(doc)))
    }

    fn node(
        &self,
        doc: &mut Document,
        object: &Data,
        node: &Node,
        filter: Option<&Filter>,
    ) -> BuildResult<()> {
        if !node.guard.passes(object, self.ctx.scope) {
            return Ok(());
        }
        if let (Some(filter), Some(name)) = (filter, node.name.as_deref()) {
            if !filter.has_filter_for(name) {
                return Ok(());
            }
        }

        let value = match &node.compute {
            Compute::Func(f) => f(&NodeContext {
                object,
                document: doc,
                scope: self.ctx.scope,
            }),
            Compute::Helper(helper) => self
                .ctx
                .scope
                .call(helper, object)
                .ok_or_else(|| BuildError::UnknownHelper {
                    name: helper.clone(),
                })?,
            Compute::Value(value) => value.clone(),
        };

        match (&node.name, value) {
            (Some(name), value) => {
                let value = match filter {
                    Some(filter) => filter.apply_functions(value, name),
                    None => value,
                };
                doc.insert(name.as_str(), value);
            }
            (None, Value::Document(other)) => doc.merge(other),
            (None, other) => {
                tracing::trace!(kind = other.type_name(), "unnamed node result is not a document, dropped");
            }
        }
        Ok(())
    }
}

/// The root name for a result named `derived`, under `setting`.
pub(crate) fn root_name(setting: &RootSetting, derived: Option<&str>) -> Option<String> {
    match setting {
        RootSetting::Named(name) => Some(name.clone()),
        RootSetting::Enabled(true) => derived.map(str::to_string),
        RootSetting::Enabled(false) => None,
    }
}

/// The filter that applies inside a result wrapped under `root`.
///
/// A filter that names the root selects within it; a filter that does not
/// is taken to be written against the unwrapped fields.
pub(crate) fn scoped<'f>(filter: Option<&'f Filter>, root: Option<&str>) -> Option<&'f Filter> {
    match (filter, root) {
        (Some(filter), Some(root)) if filter.has_filter_for(root) => filter.nested_for(root),
        (filter, _) => filter,
    }
}

/// Apply a field's `limit`/`sort` calls to collection elements.
pub(crate) fn select_items(items: Vec<Data>, field: Option<&FilterField>) -> Vec<Data> {
    match field {
        Some(field) => field.apply_to_items(items, |item, key| match key {
            Some(key) => item.member(key).map(Data::to_value).unwrap_or_default(),
            None => item.to_value(),
        }),
        None => items,
    }
}

/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Build context.
//!
//! [`BuildContext`] bundles the collaborators a build needs: configuration,
//! the calling scope, the template source and registry, and the result
//! cache. It is shared by reference through every nested build and is
//! never mutated.

use crate::cache::{CacheKey, ResultCache};
use crate::codec::Format;
use crate::compile::compile;
use crate::config::BuilderConfig;
use crate::data::Data;
use crate::directive::Directive;
use crate::error::BuildResult;
use crate::registry::TemplateRegistry;
use crate::scope::{EmptyScope, Scope};
use crate::source::{NullSource, TemplateSource};
use crate::template::{sha256_hash, Template};
use docbuild_filter::Filter;
use std::collections::HashSet;
use std::sync::Arc;

static EMPTY_SCOPE: EmptyScope = EmptyScope;
static NULL_SOURCE: NullSource = NullSource;

/// Collaborators shared by a build and all of its nested builds.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    pub(crate) config: &'a BuilderConfig,
    pub(crate) scope: &'a dyn Scope,
    pub(crate) source: &'a dyn TemplateSource,
    pub(crate) registry: Option<&'a TemplateRegistry>,
    pub(crate) cache: Option<&'a dyn ResultCache>,
}

impl<'a> BuildContext<'a> {
    /// A context with an empty scope, no template source and no cache.
    pub fn new(config: &'a BuilderConfig) -> Self {
        Self {
            config,
            scope: &EMPTY_SCOPE,
            source: &NULL_SOURCE,
            registry: None,
            cache: None,
        }
    }

    pub fn with_scope(mut self, scope: &'a dyn Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_source(mut self, source: &'a dyn TemplateSource) -> Self {
        self.source = source;
        self
    }

    /// Memoize templates loaded by `extends` in `registry`.
    pub fn with_registry(mut self, registry: &'a TemplateRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_cache(mut self, cache: &'a dyn ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &'a BuilderConfig {
        self.config
    }

    pub fn scope(&self) -> &'a dyn Scope {
        self.scope
    }

    /// The cache, if one is attached and whole-output caching is enabled.
    pub(crate) fn active_cache(&self) -> Option<&'a dyn ResultCache> {
        self.cache.filter(|_| self.config.perform_caching)
    }

    /// Load a template by name for `extends`.
    pub(crate) fn template(&self, name: &str) -> BuildResult<Arc<Template>> {
        match self.registry {
            Some(registry) => registry.load(name, self.source, &self.config.search_paths),
            None => {
                let text = self.source.resolve(name, &self.config.search_paths)?;
                Ok(Arc::new(compile(name, &text.source)?))
            }
        }
    }

    /// The cache key for building `object` with `template`, if caching is
    /// active and the object has a content key.
    ///
    /// The digest covers every template reachable through `extends`. An
    /// active filter changes the output, so it is folded in as well.
    pub(crate) fn cache_key(
        &self,
        object: &Data,
        root: Option<&str>,
        format: Format,
        template: &Template,
        filter: Option<&Filter>,
    ) -> Option<CacheKey> {
        self.active_cache()?;
        object.content_key()?;
        let digest = self.template_digest(template);
        self.cache_key_with_digest(object, root, format, &digest, filter)
    }

    /// As [`BuildContext::cache_key`], with the template digest already
    /// computed by [`BuildContext::template_digest`].
    pub(crate) fn cache_key_with_digest(
        &self,
        object: &Data,
        root: Option<&str>,
        format: Format,
        digest: &str,
        filter: Option<&Filter>,
    ) -> Option<CacheKey> {
        self.active_cache()?;
        let object_key = object.content_key()?;
        let digest = match filter {
            Some(filter) => format!("{digest}|{filter}"),
            None => digest.to_string(),
        };
        Some(
            CacheKey::new(object_key, root, format, digest)
                .with_prefix(self.config.cache_key_prefix.as_deref()),
        )
    }

    /// `template`'s digest combined with the digests of the templates it
    /// extends, at any depth.
    ///
    /// A template with no `extends` keeps its own digest. Bases that fail to
    /// load contribute their name only; the build reports the error if the
    /// `extends` actually runs.
    pub(crate) fn template_digest(&self, template: &Template) -> String {
        let mut bases = Vec::new();
        let mut seen = HashSet::new();
        self.collect_base_digests(template, &mut seen, &mut bases);
        if bases.is_empty() {
            return template.digest().to_string();
        }
        sha256_hash(&format!("{}<{}", template.digest(), bases.join("<")))
    }

    fn collect_base_digests(
        &self,
        template: &Template,
        seen: &mut HashSet<String>,
        bases: &mut Vec<String>,
    ) {
        for directive in template.directives() {
            match directive {
                Directive::Child(child) => self.collect_base_digests(&child.template, seen, bases),
                Directive::Glue(glue) => self.collect_base_digests(&glue.template, seen, bases),
                Directive::Extends(extends) => {
                    self.collect_base_digests(&extends.extra, seen, bases);
                    if !seen.insert(extends.template.clone()) {
                        continue;
                    }
                    match self.template(&extends.template) {
                        Ok(base) => {
                            bases.push(format!("{}={}", extends.template, base.digest()));
                            self.collect_base_digests(&base, seen, bases);
                        }
                        Err(_) => bases.push(format!("{}=?", extends.template)),
                    }
                }
                Directive::Attribute(_) | Directive::Node(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::data::Record;
    use crate::source::MemorySource;

    fn user() -> Data {
        Data::Record(Record::new("user").with_cache_key("users/1"))
    }

    #[test]
    fn test_cache_key_requires_caching_and_content_key() {
        let template = Template::builder().attribute("name").build();
        let cache = MemoryCache::new();

        let off = BuilderConfig::default();
        let ctx = BuildContext::new(&off).with_cache(&cache);
        assert!(ctx.cache_key(&user(), None, Format::Json, &template, None).is_none());

        let on = BuilderConfig::default().with_caching(true);
        let ctx = BuildContext::new(&on).with_cache(&cache);
        assert!(ctx.cache_key(&user(), None, Format::Json, &template, None).is_some());
        assert!(
            ctx.cache_key(&Data::Record(Record::new("user")), None, Format::Json, &template, None)
                .is_none()
        );
    }

    #[test]
    fn test_filter_changes_cache_key() {
        let template = Template::builder().attribute("name").build();
        let cache = MemoryCache::new();
        let config = BuilderConfig::default().with_caching(true);
        let ctx = BuildContext::new(&config).with_cache(&cache);
        let filter = Filter::parse("name");

        let plain = ctx.cache_key(&user(), None, Format::Json, &template, None);
        let filtered = ctx.cache_key(&user(), None, Format::Json, &template, Some(&filter));
        assert_ne!(plain, filtered);
    }

    #[test]
    fn test_template_digest_follows_bases() {
        let config = BuilderConfig::default();
        let show = compile("users/show", "- child: posts\n  template:\n    - extends: posts/base\n").unwrap();
        let plain = Template::builder().attribute("name").build();

        let source = MemorySource::with_templates([("posts/base", "- attribute: title\n")]);
        let ctx = BuildContext::new(&config).with_source(&source);
        assert_eq!(ctx.template_digest(&plain), plain.digest());
        let before = ctx.template_digest(&show);
        assert_ne!(before, show.digest());

        let edited = MemorySource::with_templates([("posts/base", "- attribute: body\n")]);
        let ctx = BuildContext::new(&config).with_source(&edited);
        assert_ne!(ctx.template_digest(&show), before);
    }

    #[test]
    fn test_template_digest_tolerates_cycles_and_missing_bases() {
        let config = BuilderConfig::default();
        let source = MemorySource::with_templates([
            ("a", "- extends: b\n"),
            ("b", "- extends: a\n- extends: missing\n"),
        ]);
        let ctx = BuildContext::new(&config).with_source(&source);
        let a = ctx.template("a").unwrap();
        assert!(ctx.template_digest(&a).starts_with("sha256:"));
    }

    #[test]
    fn test_template_loading_without_registry() {
        let config = BuilderConfig::default();
        let source = MemorySource::with_templates([("base", "- attribute: id\n")]);
        let ctx = BuildContext::new(&config).with_source(&source);

        assert_eq!(ctx.template("base").unwrap().directives().len(), 1);
        assert!(ctx.template("other").is_err());
    }
}

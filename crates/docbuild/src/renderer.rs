/*
 * renderer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! High-level entry point.
//!
//! A [`Renderer`] owns the long-lived pieces (configuration, template
//! source, compiled-template registry, result cache) and runs builds and
//! encodes their results.
//!
//! ```
//! use docbuild::{BuilderConfig, Data, EmptyScope, JsonCodec, MemorySource, Record, RenderOptions, Renderer};
//!
//! let renderer = Renderer::new(BuilderConfig::default())
//!     .with_source(MemorySource::with_templates([("users/show", "- attribute: name\n")]));
//! let leo = Data::Record(Record::new("user").with_field("name", "leo"));
//!
//! let bytes = renderer
//!     .render("users/show", &leo, &EmptyScope, &JsonCodec::new(), &RenderOptions::default())
//!     .unwrap();
//! assert_eq!(bytes, br#"{"name":"leo"}"#);
//! ```

use crate::batch::BatchBuilder;
use crate::builder::{BuildOptions, DocumentBuilder};
use crate::cache::ResultCache;
use crate::codec::{Codec, EncodeOptions};
use crate::config::BuilderConfig;
use crate::context::BuildContext;
use crate::data::Data;
use crate::error::BuildResult;
use crate::registry::TemplateRegistry;
use crate::scope::Scope;
use crate::source::{FileSystemSource, TemplateSource};
use crate::template::Template;
use docbuild_document::Value;
use std::sync::Arc;

/// Options for [`Renderer::render`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Build options. The format is taken from the codec.
    pub build: BuildOptions,

    /// Root element for codecs that need one.
    pub root_element: Option<String>,
}

impl From<BuildOptions> for RenderOptions {
    fn from(build: BuildOptions) -> Self {
        Self {
            build,
            root_element: None,
        }
    }
}

/// Builds and encodes documents with shared configuration.
pub struct Renderer {
    config: Arc<BuilderConfig>,
    source: Arc<dyn TemplateSource>,
    cache: Option<Arc<dyn ResultCache>>,
    registry: TemplateRegistry,
}

impl Renderer {
    /// Create a renderer reading templates from the configured search paths.
    pub fn new(config: BuilderConfig) -> Self {
        let source = FileSystemSource::new(config.template_extension.clone());
        Self {
            config: Arc::new(config),
            source: Arc::new(source),
            cache: None,
            registry: TemplateRegistry::new(),
        }
    }

    pub fn with_source(mut self, source: impl TemplateSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Register a template built in code under `name`.
    pub fn register(&self, name: impl Into<String>, template: Template) {
        self.registry.register(name, template);
    }

    /// Look up (loading and compiling on first use) the template `name`.
    pub fn template(&self, name: &str) -> BuildResult<Arc<Template>> {
        self.registry
            .load(name, self.source.as_ref(), &self.config.search_paths)
    }

    fn context<'a>(&'a self, scope: &'a dyn Scope) -> BuildContext<'a> {
        let ctx = BuildContext::new(&self.config)
            .with_scope(scope)
            .with_source(self.source.as_ref())
            .with_registry(&self.registry);
        match &self.cache {
            Some(cache) => ctx.with_cache(cache.as_ref()),
            None => ctx,
        }
    }

    /// Build `object` with an inline template.
    pub fn build(
        &self,
        object: &Data,
        template: &Template,
        scope: &dyn Scope,
        options: &BuildOptions,
    ) -> BuildResult<Value> {
        DocumentBuilder::new(self.context(scope)).build(object, template, options)
    }

    /// Build `object` with the template registered or found under `name`.
    pub fn build_template(
        &self,
        name: &str,
        object: &Data,
        scope: &dyn Scope,
        options: &BuildOptions,
    ) -> BuildResult<Value> {
        let template = self.template(name)?;
        self.build(object, &template, scope, options)
    }

    /// Build each object with the template `name`, in order.
    pub fn build_all(
        &self,
        name: &str,
        objects: &[Data],
        scope: &dyn Scope,
        options: &BuildOptions,
    ) -> BuildResult<Vec<Value>> {
        let template = self.template(name)?;
        BatchBuilder::new(self.context(scope)).build_all(objects, &template, options)
    }

    /// Build with the template `name` and encode the result with `codec`.
    pub fn render(
        &self,
        name: &str,
        object: &Data,
        scope: &dyn Scope,
        codec: &dyn Codec,
        options: &RenderOptions,
    ) -> BuildResult<Vec<u8>> {
        let build = options.build.clone().with_format(codec.format());
        let value = self.build_template(name, object, scope, &build)?;
        let encode = EncodeOptions {
            root_name: options.root_element.clone(),
        };
        Ok(codec.encode(&value, &encode)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::codec::XmlCodec;
    use crate::data::Record;
    use crate::error::BuildError;
    use crate::scope::EmptyScope;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;

    fn leo() -> Data {
        Data::Record(
            Record::new("user")
                .with_field("name", "leo")
                .with_cache_key("users/1"),
        )
    }

    #[test]
    fn test_build_template_by_name() {
        let renderer = Renderer::new(BuilderConfig::default())
            .with_source(MemorySource::with_templates([("users/show", "- attribute: name\n")]));
        let value = renderer
            .build_template("users/show", &leo(), &EmptyScope, &BuildOptions::default())
            .unwrap();
        assert_eq!(serde_json::to_value(value).unwrap(), serde_json::json!({ "name": "leo" }));
        assert_eq!(renderer.registry().len(), 1);
    }

    #[test]
    fn test_missing_template() {
        let renderer = Renderer::new(BuilderConfig::default()).with_source(MemorySource::new());
        let err = renderer
            .build_template("users/show", &leo(), &EmptyScope, &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, BuildError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_render_xml_uses_root() {
        let renderer = Renderer::new(BuilderConfig::default().with_include_root(true));
        renderer.register("show", Template::builder().attribute("name").build());

        let bytes = renderer
            .render("show", &leo(), &EmptyScope, &XmlCodec::compact(), &RenderOptions::default())
            .unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.ends_with("<user><name>leo</name></user>"));
    }

    #[test]
    fn test_cache_keys_distinguish_formats() {
        let cache = Arc::new(MemoryCache::new());
        let renderer = Renderer::new(BuilderConfig::default().with_caching(true))
            .with_cache(cache.clone());
        renderer.register("show", Template::builder().attribute("name").build());

        let json = crate::codec::JsonCodec::new();
        let xml = XmlCodec::compact();
        let options = RenderOptions::from(BuildOptions::default().with_root("user"));
        renderer.render("show", &leo(), &EmptyScope, &json, &options).unwrap();
        renderer.render("show", &leo(), &EmptyScope, &xml, &options).unwrap();
        renderer.render("show", &leo(), &EmptyScope, &json, &options).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().sets, 2);
    }

    #[test]
    fn test_shared_cache_sees_base_template_changes() {
        let cache = Arc::new(MemoryCache::new());
        let config = BuilderConfig::default().with_caching(true);
        let show = "- extends: users/base\n";
        let old = Renderer::new(config.clone())
            .with_source(MemorySource::with_templates([
                ("users/show", show),
                ("users/base", "- attribute: name\n"),
            ]))
            .with_cache(cache.clone());
        let new = Renderer::new(config)
            .with_source(MemorySource::with_templates([
                ("users/show", show),
                ("users/base", "- attribute: city\n"),
            ]))
            .with_cache(cache.clone());
        let leo = Data::Record(
            Record::new("user")
                .with_field("name", "leo")
                .with_field("city", "LA")
                .with_cache_key("users/1"),
        );

        let first = old
            .build_template("users/show", &leo, &EmptyScope, &BuildOptions::default())
            .unwrap();
        let second = new
            .build_template("users/show", &leo, &EmptyScope, &BuildOptions::default())
            .unwrap();

        assert_eq!(serde_json::to_value(first).unwrap(), serde_json::json!({ "name": "leo" }));
        assert_eq!(serde_json::to_value(second).unwrap(), serde_json::json!({ "city": "LA" }));
        assert_eq!(cache.len(), 2);
    }
}

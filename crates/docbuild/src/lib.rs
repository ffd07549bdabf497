/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Declarative document builder.
//!
//! A template is an ordered list of directives evaluated against a data
//! object to produce a [`Document`]:
//!
//! - `attribute`: copy a member of the object, optionally renamed
//! - `node`: compute a value with a closure or a scope helper
//! - `child`: build a nested document (or array of documents) under a name
//! - `glue`: build another document and merge its fields flat
//! - `extends`: evaluate another template and merge its result
//!
//! Every directive can be guarded with `if`/`unless`. Results can be
//! filtered with a field-selection query, cached per object, and built in
//! bulk for collections.
//!
//! # Architecture
//!
//! - [`resolver`]: shape and naming decisions (pure functions)
//! - [`builder`]: the document builder and its merge phases
//! - [`batch`]: order-preserving, cache-aware collection builds
//! - [`compile`]: YAML template files to [`Template`]s
//! - [`renderer`]: the long-lived entry point tying config, templates,
//!   cache and codecs together
//!
//! # Example
//!
//! ```
//! use docbuild::{BuildContext, BuildOptions, BuilderConfig, Data, DocumentBuilder, Record, Selector, Template};
//!
//! let leo = Data::Record(Record::new("user").with_field("name", "leo").with_field("city", "LA"));
//! let template = Template::builder()
//!     .attribute("name")
//!     .child(Selector::current().named("person"), |t| t.attribute("city"))
//!     .build();
//!
//! let config = BuilderConfig::default();
//! let value = DocumentBuilder::new(BuildContext::new(&config))
//!     .build(&leo, &template, &BuildOptions::default())
//!     .unwrap();
//! assert_eq!(
//!     serde_json::to_string(&value).unwrap(),
//!     r#"{"name":"leo","person":{"city":"LA"}}"#
//! );
//! ```

pub mod batch;
pub mod builder;
pub mod cache;
pub mod codec;
pub mod compile;
pub mod config;
pub mod context;
pub mod data;
pub mod directive;
pub mod error;
pub mod inflect;
pub mod registry;
pub mod renderer;
pub mod resolver;
pub mod scope;
pub mod source;
pub mod template;

// Re-export main types at crate root
pub use batch::BatchBuilder;
pub use builder::{BuildOptions, DocumentBuilder};
pub use cache::{CacheError, CacheKey, CacheOptions, CacheStats, MemoryCache, ResultCache};
pub use codec::{Codec, CodecError, EncodeOptions, Format, JsonCodec, XmlCodec};
pub use compile::compile;
pub use config::{BuilderConfig, ConfigError, RootSetting};
pub use context::BuildContext;
pub use data::{Data, DataList, Record};
pub use directive::{
    Attribute, Child, Compute, Condition, Directive, Extends, Glue, Guard, Node, NodeContext,
    Selector,
};
pub use error::{BuildError, BuildResult};
pub use registry::TemplateRegistry;
pub use renderer::{RenderOptions, Renderer};
pub use scope::{EmptyScope, MapScope, Scope};
pub use source::{FileSystemSource, MemorySource, NullSource, TemplateSource, TemplateText};
pub use template::{Template, TemplateBuilder};

pub use docbuild_document::{Document, NilPolicy, Value};
pub use docbuild_filter::{Filter, FilterField, FilterFunction, FunctionCall};

/*
 * batch.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Batch builder.
//!
//! Builds one template against many objects. Output order and cardinality
//! always match the input. When caching is enabled with bulk reads, every
//! element's cache key is derived up front and read with a single
//! [`ResultCache::get_multi`] call; hits are used as-is and misses are
//! built normally and written back one by one.
//!
//! [`ResultCache::get_multi`]: crate::cache::ResultCache::get_multi

use crate::builder::{BuildOptions, DocumentBuilder, scoped};
use crate::cache::CacheKey;
use crate::config::RootSetting;
use crate::context::BuildContext;
use crate::data::Data;
use crate::error::BuildResult;
use crate::resolver::{NameHints, derive_name};
use crate::template::Template;
use docbuild_document::Value;
use docbuild_filter::Filter;
use std::collections::HashMap;

/// Evaluates a template against a sequence of objects.
#[derive(Clone, Copy)]
pub struct BatchBuilder<'a> {
    ctx: BuildContext<'a>,
}

/// Per-element build plan.
struct Planned<'d, 'f> {
    item: &'d Data,
    root: Option<String>,
    filter: Option<&'f Filter>,
    key: Option<CacheKey>,
}

impl<'a> BatchBuilder<'a> {
    pub fn new(ctx: BuildContext<'a>) -> Self {
        Self { ctx }
    }

    /// Build every object, returning one result per object in input order.
    ///
    /// Elements are wrapped according to `options.object_root` (unwrapped
    /// when unset); the sequence itself is never wrapped.
    pub fn build_all(
        &self,
        objects: &[Data],
        template: &Template,
        options: &BuildOptions,
    ) -> BuildResult<Vec<Value>> {
        let element_root = options
            .object_root
            .clone()
            .unwrap_or(RootSetting::Enabled(false));
        self.build_items(
            objects,
            template,
            &element_root,
            None,
            0,
            options.active_filter(),
            options,
        )
    }

    /// Build collection elements at `depth`.
    ///
    /// `collection_name` is the derived name of the enclosing collection;
    /// its singular names elements when `element_root` is enabled without
    /// an explicit name.
    pub(crate) fn build_items(
        &self,
        items: &[Data],
        template: &Template,
        element_root: &RootSetting,
        collection_name: Option<&str>,
        depth: usize,
        filter: Option<&Filter>,
        options: &BuildOptions,
    ) -> BuildResult<Vec<Value>> {
        let builder = DocumentBuilder::new(self.ctx);
        let hints = NameHints {
            collection_root: collection_name,
        };

        let digest = self
            .ctx
            .active_cache()
            .map(|_| self.ctx.template_digest(template));
        let plans: Vec<Planned<'_, '_>> = items
            .iter()
            .map(|item| {
                let root = match element_root {
                    RootSetting::Named(name) => Some(name.clone()),
                    RootSetting::Enabled(true) => derive_name(None, item, hints),
                    RootSetting::Enabled(false) => None,
                };
                let filter = scoped(filter, root.as_deref());
                let key = digest.as_deref().and_then(|digest| {
                    self.ctx
                        .cache_key_with_digest(item, root.as_deref(), options.format, digest, filter)
                });
                Planned {
                    item,
                    root,
                    filter,
                    key,
                }
            })
            .collect();

        let bulk = match self.ctx.active_cache() {
            Some(cache) if self.ctx.config.use_read_multi => Some(cache),
            _ => None,
        };
        let hits = match bulk {
            Some(cache) => {
                let keys: Vec<_> = plans.iter().filter_map(|plan| plan.key.clone()).collect();
                if keys.is_empty() {
                    HashMap::new()
                } else {
                    cache.get_multi(&keys)?
                }
            }
            None => HashMap::new(),
        };
        let hit_count = hits.len();

        let mut results = Vec::with_capacity(plans.len());
        for plan in &plans {
            let root = plan.root.as_deref();
            let value = match (bulk, &plan.key) {
                (Some(cache), Some(key)) => match hits.get(key).cloned() {
                    Some(value) => value,
                    None => {
                        let value = builder.build_uncached(
                            plan.item,
                            template,
                            root,
                            depth,
                            plan.filter,
                            options,
                        )?;
                        cache.set(key, &value, &options.cache)?;
                        value
                    }
                },
                _ => {
                    builder.build_object(plan.item, template, root, depth, plan.filter, options)?
                }
            };
            results.push(value);
        }

        if bulk.is_some() {
            tracing::debug!(
                items = plans.len(),
                hits = hit_count,
                misses = plans.len() - hit_count,
                "batch build"
            );
        }

        if self.ctx.config.exclude_empty_values_in_collections {
            results.retain(|value| !value.is_empty());
        }
        Ok(results)
    }
}

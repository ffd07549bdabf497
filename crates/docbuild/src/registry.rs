/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled template memoization.

use crate::compile::compile;
use crate::error::BuildResult;
use crate::source::TemplateSource;
use crate::template::Template;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Templates by name, compiled at most once.
///
/// Templates registered in code take precedence over the template source.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: RwLock<HashMap<String, Arc<Template>>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under `name`, replacing any earlier one.
    pub fn register(&self, name: impl Into<String>, template: Template) {
        let name = name.into();
        let template = template.with_name(name.clone());
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(template));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Template>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Return the template `name`, loading and compiling it from `source`
    /// on first use.
    pub fn load(
        &self,
        name: &str,
        source: &dyn TemplateSource,
        search_paths: &[PathBuf],
    ) -> BuildResult<Arc<Template>> {
        if let Some(template) = self.get(name) {
            return Ok(template);
        }
        let text = source.resolve(name, search_paths)?;
        let template = Arc::new(compile(name, &text.source)?);
        tracing::debug!(
            template = name,
            location = %text.location.display(),
            "registered template"
        );
        // Another caller may have loaded it meanwhile; keep the first.
        let mut templates = self.templates.write().unwrap_or_else(PoisonError::into_inner);
        Ok(templates.entry(name.to_string()).or_insert(template).clone())
    }

    pub fn len(&self) -> usize {
        self.templates.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

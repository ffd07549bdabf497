/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template lookup.
//!
//! A [`TemplateSource`] turns a template name (as used by `extends` or a
//! renderer call) into source text. Lookup rules for the filesystem:
//!
//! - A name without an extension gets the configured extension.
//! - Search paths are tried in order.
//! - If no file matches, the partial form of the name is tried: the final
//!   path segment with a leading underscore (`users/show` becomes
//!   `users/_show`).

use crate::error::{BuildError, BuildResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Template text plus where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateText {
    pub source: String,
    pub location: PathBuf,
}

/// Trait for loading templates by name.
pub trait TemplateSource: Send + Sync {
    /// Load the template `name`.
    ///
    /// Fails with [`BuildError::TemplateNotFound`] listing every location
    /// tried.
    fn resolve(&self, name: &str, search_paths: &[PathBuf]) -> BuildResult<TemplateText>;
}

/// Source that reads templates from disk.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    extension: String,
}

impl Default for FileSystemSource {
    fn default() -> Self {
        Self::new("yml")
    }
}

impl FileSystemSource {
    /// Create a source that appends `extension` to bare names.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Every path tried for `name`, in order.
    pub fn candidates(&self, name: &str, search_paths: &[PathBuf]) -> Vec<PathBuf> {
        let names = [
            with_extension(Path::new(name), &self.extension),
            with_extension(&partial_name(name), &self.extension),
        ];
        let mut candidates = Vec::new();
        for name in &names {
            if search_paths.is_empty() || name.is_absolute() {
                candidates.push(name.clone());
            } else {
                candidates.extend(search_paths.iter().map(|dir| dir.join(name)));
            }
        }
        candidates.dedup();
        candidates
    }
}

impl TemplateSource for FileSystemSource {
    fn resolve(&self, name: &str, search_paths: &[PathBuf]) -> BuildResult<TemplateText> {
        let candidates = self.candidates(name, search_paths);
        for path in &candidates {
            if !path.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(template = name, path = %path.display(), "loaded template");
            return Ok(TemplateText {
                source,
                location: path.clone(),
            });
        }
        Err(BuildError::TemplateNotFound {
            name: name.to_string(),
            searched: candidates,
        })
    }
}

/// Source that returns nothing (for templates without `extends`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl TemplateSource for NullSource {
    fn resolve(&self, name: &str, _search_paths: &[PathBuf]) -> BuildResult<TemplateText> {
        Err(BuildError::TemplateNotFound {
            name: name.to_string(),
            searched: Vec::new(),
        })
    }
}

/// Source that serves templates from an in-memory map.
///
/// Useful for testing and for templates bundled into the application. The
/// partial fallback applies here too.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.templates.insert(name.into(), source.into());
        self
    }

    pub fn with_templates(
        templates: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut source = Self::new();
        for (name, text) in templates {
            source.add(name, text);
        }
        source
    }
}

impl TemplateSource for MemorySource {
    fn resolve(&self, name: &str, _search_paths: &[PathBuf]) -> BuildResult<TemplateText> {
        let partial = partial_name(name);
        let partial = partial.to_string_lossy();
        [name, partial.as_ref()]
            .into_iter()
            .find_map(|key| {
                self.templates.get(key).map(|source| TemplateText {
                    source: source.clone(),
                    location: PathBuf::from(key),
                })
            })
            .ok_or_else(|| BuildError::TemplateNotFound {
                name: name.to_string(),
                searched: vec![PathBuf::from(name), PathBuf::from(partial.as_ref())],
            })
    }
}

/// The partial form of `name`: its final segment prefixed with `_`.
pub fn partial_name(name: &str) -> PathBuf {
    let path = Path::new(name);
    match path.file_name().and_then(|file| file.to_str()) {
        Some(file) if !file.starts_with('_') => path.with_file_name(format!("_{file}")),
        _ => path.to_path_buf(),
    }
}

fn with_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() || extension.is_empty() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

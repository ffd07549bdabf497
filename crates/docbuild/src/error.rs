/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template loading and document building.

use crate::cache::CacheError;
use crate::codec::CodecError;
use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building documents.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An attribute was absent on the object while strict mode is on.
    #[error("Missing attribute: {name}")]
    MissingAttribute { name: String },

    /// A template (from `extends` or a renderer lookup) could not be found.
    #[error("Template not found: {name} (searched {})", format_paths(.searched))]
    TemplateNotFound { name: String, searched: Vec<PathBuf> },

    /// Nested builds exceeded the configured depth.
    #[error("Template nesting too deep (depth {depth} > {max_depth}): {name}")]
    TemplateCycle {
        name: String,
        depth: usize,
        max_depth: usize,
    },

    /// A node names a helper the scope does not provide.
    #[error("Unknown helper: {name}")]
    UnknownHelper { name: String },

    /// A template source could not be compiled.
    #[error("Invalid template {name}: {message}")]
    TemplateSyntax { name: String, message: String },

    /// I/O error reading a template file.
    #[error("Cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

fn format_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no paths".to_string();
    }
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Builder configuration.
//!
//! A [`BuilderConfig`] is constructed once (in code, or loaded from YAML or
//! JSON) and then shared read-only by every build. Nothing in the builder
//! mutates it.
//!
//! ```yaml
//! raise_on_missing_attribute: true
//! nil_policy: drop-nil
//! perform_caching: true
//! use_read_multi: true
//! include_root: true
//! include_child_root: false
//! search_paths: [app/views]
//! ```

use docbuild_document::NilPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root inclusion: on/off, or on with an explicit name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RootSetting {
    Enabled(bool),
    Named(String),
}

impl RootSetting {
    pub fn is_enabled(&self) -> bool {
        match self {
            RootSetting::Enabled(enabled) => *enabled,
            RootSetting::Named(_) => true,
        }
    }

    pub fn explicit_name(&self) -> Option<&str> {
        match self {
            RootSetting::Named(name) => Some(name),
            RootSetting::Enabled(_) => None,
        }
    }
}

impl Default for RootSetting {
    fn default() -> Self {
        RootSetting::Enabled(false)
    }
}

impl From<bool> for RootSetting {
    fn from(value: bool) -> Self {
        RootSetting::Enabled(value)
    }
}

impl From<&str> for RootSetting {
    fn from(value: &str) -> Self {
        RootSetting::Named(value.to_string())
    }
}

/// Options consulted by the document and batch builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    /// Fail with a missing-attribute error instead of omitting the key.
    pub raise_on_missing_attribute: bool,

    /// Null handling applied to every finished document.
    pub nil_policy: NilPolicy,

    /// Cache whole build results for objects with a content key.
    pub perform_caching: bool,

    /// Read collection element results with one bulk cache read.
    pub use_read_multi: bool,

    /// Root wrapping for top-level results.
    pub include_root: RootSetting,

    /// Root wrapping for elements of collection children.
    pub include_child_root: bool,

    /// Drop empty element results from collections.
    pub exclude_empty_values_in_collections: bool,

    /// Maximum nesting of child/glue/extends builds.
    pub max_depth: usize,

    /// Directories searched for templates, in order.
    pub search_paths: Vec<PathBuf>,

    /// Extension appended to template names that have none.
    pub template_extension: String,

    /// Prefix for every cache key.
    pub cache_key_prefix: Option<String>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            raise_on_missing_attribute: false,
            nil_policy: NilPolicy::None,
            perform_caching: false,
            use_read_multi: true,
            include_root: RootSetting::Enabled(false),
            include_child_root: false,
            exclude_empty_values_in_collections: false,
            max_depth: 32,
            search_paths: Vec::new(),
            template_extension: "yml".to_string(),
            cache_key_prefix: None,
        }
    }
}

/// Errors loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

impl BuilderConfig {
    /// Parse a YAML configuration. Missing keys take their defaults.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null, not as an empty map.
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(source)?;
        config.validated()
    }

    /// Parse a JSON configuration. Missing keys take their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validated()
    }

    /// Load a configuration file, choosing the format by extension
    /// (`.json` is JSON, anything else is YAML).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_yaml_str(&source),
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(self)
    }

    pub fn with_nil_policy(mut self, policy: NilPolicy) -> Self {
        self.nil_policy = policy;
        self
    }

    pub fn with_include_root(mut self, root: impl Into<RootSetting>) -> Self {
        self.include_root = root.into();
        self
    }

    pub fn with_child_root(mut self, enabled: bool) -> Self {
        self.include_child_root = enabled;
        self
    }

    pub fn with_strict_attributes(mut self, strict: bool) -> Self {
        self.raise_on_missing_attribute = strict;
        self
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.perform_caching = enabled;
        self
    }

    pub fn with_read_multi(mut self, enabled: bool) -> Self {
        self.use_read_multi = enabled;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_exclude_empty(mut self, enabled: bool) -> Self {
        self.exclude_empty_values_in_collections = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_yaml_config() {
        let config = BuilderConfig::from_yaml_str(
            r#"
raise_on_missing_attribute: true
nil_policy: drop-nil
perform_caching: true
include_root: person
search_paths: [views, shared]
"#,
        )
        .unwrap();

        assert!(config.raise_on_missing_attribute);
        assert_eq!(config.nil_policy, NilPolicy::DropNil);
        assert!(config.perform_caching);
        assert_eq!(config.include_root, RootSetting::Named("person".to_string()));
        assert_eq!(
            config.search_paths,
            vec![PathBuf::from("views"), PathBuf::from("shared")]
        );
        // untouched keys keep defaults
        assert!(config.use_read_multi);
        assert_eq!(config.max_depth, 32);
    }

    #[test]
    fn test_root_setting_forms() {
        let config = BuilderConfig::from_yaml_str("include_root: true").unwrap();
        assert!(config.include_root.is_enabled());
        assert_eq!(config.include_root.explicit_name(), None);

        let config = BuilderConfig::from_json_str(r#"{"include_root": "people"}"#).unwrap();
        assert_eq!(config.include_root.explicit_name(), Some("people"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(BuilderConfig::from_yaml_str("").unwrap(), BuilderConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = BuilderConfig::from_yaml_str("include_roots: true").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = BuilderConfig::from_yaml_str("max_depth: 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDepth));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docbuild.json");
        std::fs::write(&path, r#"{"nil_policy": "blank-to-empty"}"#).unwrap();

        let config = BuilderConfig::from_file(&path).unwrap();
        assert_eq!(config.nil_policy, NilPolicy::BlankToEmpty);

        let missing = BuilderConfig::from_file(&dir.path().join("nope.yml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}

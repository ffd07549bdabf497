/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Result caching.
//!
//! Builders consult a [`ResultCache`] for objects that expose a content key.
//! The store itself is a collaborator: [`MemoryCache`] is provided for
//! single-process use and tests.

use crate::codec::Format;
use crate::error::BuildResult;
use docbuild_document::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Identity of a cached build result.
///
/// Equal keys must map to identical output, so every input that changes the
/// output is part of the key: the object's content key, the root name it is
/// wrapped under, the output format and the template digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    prefix: Option<String>,
    object: String,
    root: Option<String>,
    format: Format,
    digest: String,
}

impl CacheKey {
    pub fn new(
        object: impl Into<String>,
        root: Option<&str>,
        format: Format,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            prefix: None,
            object: object.into(),
            root: root.map(str::to_string),
            format,
            digest: digest.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_string);
        self
    }

    pub fn object(&self) -> &str {
        &self.object
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{prefix}/")?;
        }
        write!(
            f,
            "{}/{}/{}/{}",
            self.object,
            self.root.as_deref().unwrap_or("-"),
            self.format.name(),
            self.digest
        )
    }
}

/// Options passed through to [`ResultCache::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub expires_in: Option<Duration>,
}

/// Cache backend failures. These propagate out of builds unchanged.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {message}")]
    Backend { message: String },

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// A store for build results.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError>;

    /// Read many keys at once. Keys absent from the result are misses.
    fn get_multi(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, Value>, CacheError> {
        let mut found = HashMap::new();
        for key in keys {
            if let Some(value) = self.get(key)? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    fn set(&self, key: &CacheKey, value: &Value, options: &CacheOptions) -> Result<(), CacheError>;
}

/// Return the cached value for `key`, or compute, store and return it.
///
/// `compute` runs only on a miss.
pub fn fetch(
    cache: &dyn ResultCache,
    key: &CacheKey,
    options: &CacheOptions,
    compute: impl FnOnce() -> BuildResult<Value>,
) -> BuildResult<Value> {
    if let Some(value) = cache.get(key)? {
        tracing::debug!(key = %key, "cache hit");
        return Ok(value);
    }
    tracing::debug!(key = %key, "cache miss");
    let value = compute()?;
    cache.set(key, &value, options)?;
    Ok(value)
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

/// Operation counts recorded by [`MemoryCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub gets: usize,
    pub multi_gets: usize,
    pub sets: usize,
}

/// An in-process cache with optional per-entry expiry.
///
/// Thread safety: Uses RwLock to satisfy Send + Sync trait bounds.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    gets: AtomicUsize,
    multi_gets: AtomicUsize,
    sets: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.entries
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .clear();
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            gets: self.gets.load(Ordering::Relaxed),
            multi_gets: self.multi_gets.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }

    fn lookup(entries: &HashMap<CacheKey, Entry>, key: &CacheKey, now: Instant) -> Option<Value> {
        entries
            .get(key)
            .filter(|entry| entry.expires_at.is_none_or(|at| at > now))
            .map(|entry| entry.value.clone())
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(Self::lookup(&entries, key, Instant::now()))
    }

    fn get_multi(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, Value>, CacheError> {
        self.multi_gets.fetch_add(1, Ordering::Relaxed);
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        let now = Instant::now();
        Ok(keys
            .iter()
            .filter_map(|key| Self::lookup(&entries, key, now).map(|value| (key.clone(), value)))
            .collect())
    }

    fn set(&self, key: &CacheKey, value: &Value, options: &CacheOptions) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::Relaxed);
        let entry = Entry {
            value: value.clone(),
            expires_at: options.expires_in.map(|ttl| Instant::now() + ttl),
        };
        self.entries
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .insert(key.clone(), entry);
        Ok(())
    }
}

/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Ordered document values for docbuild.
//!
//! A build produces a [`Document`]: an ordered mapping from key to
//! [`Value`]. Documents are format-neutral; codecs turn them into JSON, XML
//! and friends. [`NilPolicy`] describes the single null-handling transform
//! applied to a finished document.

pub mod document;
pub mod nil;
pub mod value;

pub use document::Document;
pub use nil::NilPolicy;
pub use value::Value;

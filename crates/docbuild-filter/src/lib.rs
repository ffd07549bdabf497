/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Field-selection queries for docbuild documents.
//!
//! A filter query names the fields to keep, optionally transforms
//! sequences, and recurses into nested documents:
//!
//! ```text
//! id,user{name,posts.sort(created_at,desc).limit(3){title}}
//! ```
//!
//! - Fields are separated by commas and matched case-sensitively
//! - `{...}` selects fields of a nested document (or of each document in a
//!   nested array)
//! - `.limit(n)` keeps the first `n` elements of a sequence
//! - `.sort(key)` / `.sort(key, desc)` orders a sequence by `key`
//!
//! Parsing never fails. Text that does not match the grammar is ignored.
//!
//! # Example
//!
//! ```
//! use docbuild_filter::Filter;
//!
//! let filter = Filter::parse("user{name,age.limit(1)}");
//! assert!(filter.has_filter_for("user"));
//! assert!(filter.nested_for("user").unwrap().has_filter_for("age"));
//! ```

pub mod apply;
pub mod ast;
pub mod parser;

pub use ast::{Filter, FilterField, FilterFunction, FunctionCall};
pub use parser::underscore;

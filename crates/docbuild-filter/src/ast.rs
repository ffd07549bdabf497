/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsed filter types.

use std::fmt;

/// A parsed field-selection query.
///
/// A filter is an ordered set of [`FilterField`]s. Lookups are
/// case-sensitive and return the first field with a matching name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub(crate) fields: Vec<FilterField>,
    pub(crate) parent: Option<String>,
}

/// One selected field, with the functions applied to it and an optional
/// nested selection for its children.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterField {
    pub name: String,
    pub functions: Vec<FunctionCall>,
    pub nested: Option<Filter>,
}

/// A function call attached to a field, e.g. `.limit(5)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function: FilterFunction,
    pub args: Vec<String>,
}

/// Functions the query language understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFunction {
    /// `limit(n)`: keep the first `n` elements of a sequence.
    Limit,

    /// `sort(key)` or `sort(key, desc)`: order a sequence by `key`.
    Sort,
}

impl FilterFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "limit" => Some(FilterFunction::Limit),
            "sort" => Some(FilterFunction::Sort),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterFunction::Limit => "limit",
            FilterFunction::Sort => "sort",
        }
    }
}

impl Filter {
    /// Create a filter from already-built fields.
    pub fn from_fields(fields: Vec<FilterField>) -> Self {
        Self {
            fields,
            parent: None,
        }
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    /// The underscored name of the field this filter is nested under.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_filter_for(&self, field_name: &str) -> bool {
        self.get_filter(field_name).is_some()
    }

    pub fn get_filter(&self, field_name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|field| field.name == field_name)
    }

    /// The nested filter declared for `field_name`, if it has a non-empty one.
    pub fn nested_for(&self, field_name: &str) -> Option<&Filter> {
        self.get_filter(field_name)
            .and_then(|field| field.nested.as_ref())
            .filter(|nested| !nested.is_empty())
    }
}

impl FilterField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            nested: None,
        }
    }

    pub fn with_function(mut self, function: FilterFunction, args: &[&str]) -> Self {
        self.functions.push(FunctionCall {
            function,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });
        self
    }

    pub fn with_nested(mut self, nested: Filter) -> Self {
        self.nested = Some(nested);
        self
    }
}

/// Writes the canonical query string for this filter.
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for call in &self.functions {
            write!(f, ".{}({})", call.function.name(), call.args.join(","))?;
        }
        if let Some(nested) = &self.nested {
            write!(f, "{{{nested}}}")?;
        }
        Ok(())
    }
}

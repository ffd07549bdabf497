/*
 * codec.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Output formats and the reference JSON/XML codecs.
//!
//! Builders produce format-neutral [`Value`]s; a [`Codec`] turns one into
//! bytes. Only JSON and XML encoders are provided here. The other
//! [`Format`]s exist so cache keys can distinguish them.

use crate::inflect::singularize;
use docbuild_document::{Document, Value};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Xml,
    Msgpack,
    Bson,
    Plist,
    Csv,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Msgpack => "msgpack",
            Format::Bson => "bson",
            Format::Plist => "plist",
            Format::Csv => "csv",
        }
    }

    /// True if documents in this format must have a single root element.
    pub fn requires_root(self) -> bool {
        matches!(self, Format::Xml | Format::Plist)
    }
}

/// Errors produced while encoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML encoding failed: {message}")]
    Xml { message: String },
}

/// Per-call encoding options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Root element name for formats that need one. When absent, a
    /// single-key document supplies its key, else the codec's default.
    pub root_name: Option<String>,
}

impl EncodeOptions {
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root_name: Some(root.into()),
        }
    }
}

/// Serializes built values.
pub trait Codec {
    fn format(&self) -> Format;

    fn encode(&self, value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, CodecError>;
}

/// JSON output via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn encode(&self, value: &Value, _options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }
}

/// XML output via `quick-xml`.
///
/// Keys are dasherized (`first_name` becomes `<first-name>`), arrays carry
/// `type="array"` and contain one element per item named by the singular
/// of the array's key, non-string scalars carry a `type` attribute and
/// nulls are written as `nil="true"` empty elements.
#[derive(Debug, Clone, Copy)]
pub struct XmlCodec {
    indent: usize,
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl XmlCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write everything on one line.
    pub fn compact() -> Self {
        Self { indent: 0 }
    }
}

const DEFAULT_XML_ROOT: &str = "hash";
const DEFAULT_XML_ARRAY_ROOT: &str = "objects";

impl Codec for XmlCodec {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn encode(&self, value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, CodecError> {
        let mut writer = if self.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', self.indent)
        } else {
            Writer::new(Vec::new())
        };
        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;

        match (&options.root_name, value) {
            (Some(root), value) => write_element(&mut writer, root, value)?,
            (None, Value::Document(doc)) if doc.len() == 1 => {
                for (key, inner) in doc {
                    write_element(&mut writer, key, inner)?;
                }
            }
            (None, Value::Array(_)) => write_element(&mut writer, DEFAULT_XML_ARRAY_ROOT, value)?,
            (None, value) => write_element(&mut writer, DEFAULT_XML_ROOT, value)?,
        }

        Ok(writer.into_inner())
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CodecError> {
    writer.write_event(event).map_err(|err| CodecError::Xml {
        message: err.to_string(),
    })
}

fn dasherize(key: &str) -> String {
    key.replace('_', "-")
}

fn write_element(writer: &mut Writer<Vec<u8>>, key: &str, value: &Value) -> Result<(), CodecError> {
    let name = dasherize(key);
    let mut start = BytesStart::new(name.as_str());

    match value {
        Value::Null => {
            start.push_attribute(("nil", "true"));
            write_event(writer, Event::Empty(start))
        }
        Value::Document(doc) => write_document(writer, start, &name, doc),
        Value::Array(items) => {
            start.push_attribute(("type", "array"));
            if items.is_empty() {
                return write_event(writer, Event::Empty(start));
            }
            write_event(writer, Event::Start(start))?;
            let item_name = singularize(key);
            for item in items {
                write_element(writer, &item_name, item)?;
            }
            write_event(writer, Event::End(BytesEnd::new(name.as_str())))
        }
        scalar => {
            let type_name = match scalar {
                Value::Bool(_) => Some("boolean"),
                Value::Integer(_) => Some("integer"),
                Value::Float(_) => Some("float"),
                _ => None,
            };
            if let Some(type_name) = type_name {
                start.push_attribute(("type", type_name));
            }
            let text = scalar.to_text().unwrap_or_default();
            write_event(writer, Event::Start(start))?;
            write_event(writer, Event::Text(BytesText::new(&text)))?;
            write_event(writer, Event::End(BytesEnd::new(name.as_str())))
        }
    }
}

fn write_document(
    writer: &mut Writer<Vec<u8>>,
    start: BytesStart<'_>,
    name: &str,
    doc: &Document,
) -> Result<(), CodecError> {
    if doc.is_empty() {
        return write_event(writer, Event::Empty(start));
    }
    write_event(writer, Event::Start(start))?;
    for (key, value) in doc {
        write_element(writer, key, value)?;
    }
    write_event(writer, Event::End(BytesEnd::new(name)))
}

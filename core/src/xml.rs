//! Schema-less XML marshalling for `Value` trees.
//!
//! # Design
//! Marshalling walks a `Map` in insertion order and emits one child element
//! per scalar or map entry, and one sibling element per list item. Reading
//! goes the other way with one deliberate asymmetry: a tag that occurs once
//! under a parent becomes a bare value, and only a repeated tag becomes a
//! `List`. Callers that expect "one or many" must go through `Value::items`.
//!
//! Elements with neither text nor child elements read as absent, so no
//! unmarshalled `Map` or `List` is ever empty. A leaf keeps its text
//! verbatim, whitespace included. Once an element has a child element its
//! own text is dropped, so mixed content whose children are all absent reads
//! as absent too. Attributes and namespaces are not modelled.

use std::fmt;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::value::{Map, Value};

/// Errors produced by the XML codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// A field name or value the XML data model cannot carry.
    #[error("unable to serialize {field}={value}")]
    Serialization { field: String, value: String },

    /// The input is not a well-formed document.
    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// Serialize `map` as the children of a root element named `root`.
pub fn marshal(root: &str, map: &Map) -> Result<Vec<u8>, XmlError> {
    check_name(root, &"<document>")?;
    let mut writer = Writer::new(Vec::new());
    write_map(&mut writer, root, map)?;
    Ok(writer.into_inner())
}

/// Parse a document and convert its root element.
///
/// Returns `Ok(None)` when the root element carries neither text nor any
/// non-absent child.
pub fn unmarshal(data: &[u8]) -> Result<Option<Value>, XmlError> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Option<Value>> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::Malformed(e.to_string()))?;
        match event {
            Event::Start(e) => stack.push(Frame::new(element_name(&e))),
            Event::Empty(e) => attach(&mut stack, &mut root, element_name(&e), None)?,
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected end tag".to_string()))?;
                let (name, value) = frame.finish();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| XmlError::Malformed(e.to_string()))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(XmlError::Malformed(
                            "text outside of the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(c) => {
                let text = c.decode().map_err(|e| XmlError::Malformed(e.to_string()))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Malformed(format!(
            "document ended inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| XmlError::Malformed("document has no root element".to_string()))
}

/// An element that has been opened but not yet closed.
struct Frame {
    name: String,
    text: String,
    fields: Map,
    has_children: bool,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            fields: Map::new(),
            has_children: false,
        }
    }

    /// Add a child value, collapsing repeated tags into a `List`.
    fn push(&mut self, name: String, value: Value) {
        match self.fields.get_mut(&name) {
            Some(Value::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, Value::List(Vec::new()));
                *existing = Value::List(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    fn finish(self) -> (String, Option<Value>) {
        let value = if self.has_children {
            (!self.fields.is_empty()).then_some(Value::Map(self.fields))
        } else if self.text.is_empty() {
            None
        } else {
            Some(Value::Scalar(self.text))
        };
        (self.name, value)
    }
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<Option<Value>>,
    name: String,
    value: Option<Value>,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.has_children = true;
            if let Some(value) = value {
                parent.push(name, value);
            }
            Ok(())
        }
        None if root.is_some() => Err(XmlError::Malformed(format!(
            "second root element <{name}>"
        ))),
        None => {
            *root = Some(value);
            Ok(())
        }
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn write_map<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    map: &Map,
) -> Result<(), XmlError> {
    write_event(writer, tag, Event::Start(BytesStart::new(tag)))?;
    for (name, value) in map.iter() {
        write_value(writer, name, value)?;
    }
    write_event(writer, tag, Event::End(BytesEnd::new(tag)))
}

fn write_value<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), XmlError> {
    check_name(name, value)?;
    match value {
        Value::Scalar(text) => {
            check_text(name, text)?;
            write_event(writer, name, Event::Start(BytesStart::new(name)))?;
            if !text.is_empty() {
                write_event(writer, name, Event::Text(BytesText::new(text)))?;
            }
            write_event(writer, name, Event::End(BytesEnd::new(name)))
        }
        Value::List(items) => items
            .iter()
            .try_for_each(|item| write_value(writer, name, item)),
        Value::Map(map) => write_map(writer, name, map),
    }
}

fn write_event<W: std::io::Write>(
    writer: &mut Writer<W>,
    field: &str,
    event: Event<'_>,
) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Serialization {
            field: field.to_string(),
            value: e.to_string(),
        })
}

fn check_name(name: &str, value: &dyn fmt::Display) -> Result<(), XmlError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => chars
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(XmlError::Serialization {
            field: name.to_string(),
            value: value.to_string(),
        })
    }
}

fn check_text(name: &str, text: &str) -> Result<(), XmlError> {
    let forbidden = |c: char| {
        (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
    };
    if text.chars().any(forbidden) {
        return Err(XmlError::Serialization {
            field: name.to_string(),
            value: format!("{text:?}"),
        });
    }
    Ok(())
}

//! Minimal XML element tree for reading gateway requests and writing
//! responses.
//!
//! Kept independent of `schlund-core` so the integration tests catch any
//! drift between the client's encoding and what a gateway expects.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

/// A parsed element: its name, accumulated text and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed text at a path of child names below this element.
    pub fn text_at(&self, path: &[&str]) -> Option<&str> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        Some(current.text.trim())
    }
}

/// Parse a document into its root element.
pub fn parse(body: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => stack.push(Element {
                name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                ..Element::default()
            }),
            Event::Empty(e) => {
                let element = Element {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    ..Element::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or("unbalanced end tag")?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Event::Eof => return Err("document has no complete root element".to_string()),
            _ => {}
        }
    }
}

/// Render `<name>text</name>` with the text escaped.
pub fn leaf(name: &str, text: &str) -> String {
    format!("<{name}>{}</{name}>", escape(text))
}

/// Wrap a rendered `result` body in a gateway response envelope.
pub fn response(status_type: &str, code: &str, text: &str, data: Option<String>) -> String {
    let data = data.map(|d| format!("<data>{d}</data>")).unwrap_or_default();
    format!(
        "<response><result>{data}<status>{}{}{}</status></result></response>",
        leaf("code", code),
        leaf("text", text),
        leaf("type", status_type),
    )
}

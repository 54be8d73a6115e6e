//! Response body decoding, selected by `content-type`.
//!
//! XML is converted to JSON with the root element stripped: repeated child names
//! become arrays, text-only elements become strings, empty elements become `""`
//! and attributes (including `xmlns`) are dropped.

use std::collections::BTreeMap;
use std::str;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value as JsonValue};

use crate::http::header_ci;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON response body: {0}")]
    Json(String),
    #[error("invalid XML response body: {0}")]
    Xml(String),
}

pub fn decode_body(
    headers: &BTreeMap<String, String>,
    body: &[u8],
) -> Result<JsonValue, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonValue::Object(Map::new()));
    }
    let content_type = header_ci(headers, "content-type")
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("json") {
        serde_json::from_slice(body).map_err(|e| DecodeError::Json(e.to_string()))
    } else if content_type.contains("xml") {
        let text = str::from_utf8(body).map_err(|e| DecodeError::Xml(e.to_string()))?;
        xml_to_json(text)
    } else {
        Ok(JsonValue::String(String::from_utf8_lossy(body).into_owned()))
    }
}

struct Frame {
    name: String,
    children: Map<String, JsonValue>,
    text: String,
}

impl Frame {
    fn into_value(self) -> (String, JsonValue) {
        let value = if self.children.is_empty() {
            JsonValue::String(self.text)
        } else {
            JsonValue::Object(self.children)
        };
        (self.name, value)
    }
}

/// Whitespace-only text nodes are layout and are skipped. Other text is kept verbatim.
pub fn xml_to_json(text: &str) -> Result<JsonValue, DecodeError> {
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<JsonValue> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(e.local_name().as_ref())?;
                stack.push(Frame {
                    name,
                    children: Map::new(),
                    text: String::new(),
                });
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(e.local_name().as_ref())?;
                attach(&mut stack, &mut root, name, JsonValue::String(String::new()));
            }
            Ok(Event::Text(t)) => {
                let unescaped = t.unescape().map_err(|e| DecodeError::Xml(e.to_string()))?;
                if unescaped.trim().is_empty() {
                    continue;
                }
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(frame) = stack.pop() {
                    let (name, value) = frame.into_value();
                    attach(&mut stack, &mut root, name, value);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DecodeError::Xml(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::Xml(format!("unclosed element <{}>", open.name)));
    }
    Ok(root.unwrap_or_else(|| JsonValue::Object(Map::new())))
}

fn element_name(raw: &[u8]) -> Result<String, DecodeError> {
    str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| DecodeError::Xml("invalid UTF-8 in element name".into()))
}

// The root element is stripped: its value becomes the document.
fn attach(stack: &mut [Frame], root: &mut Option<JsonValue>, name: String, value: JsonValue) {
    let Some(parent) = stack.last_mut() else {
        *root = Some(value);
        return;
    };
    match parent.children.get_mut(&name) {
        Some(JsonValue::Array(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::take(existing);
            *existing = JsonValue::Array(vec![first, value]);
        }
        None => {
            parent.children.insert(name, value);
        }
    }
}

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;

use crate::core::EncodeError;

fn xml_io(e: std::io::Error) -> EncodeError {
    EncodeError::Xml(e.to_string())
}

/// Escape an attribute value the way exclusive C14N serializes it: only `&`,
/// `<`, `"` and the whitespace characters tab, line feed and carriage return.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '"', '\t', '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '"' => escaped.push_str("&quot;"),
            '\t' => escaped.push_str("&#x9;"),
            '\n' => escaped.push_str("&#xA;"),
            '\r' => escaped.push_str("&#xD;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Unindented XML writer whose output is already in exclusive-canonical shape
/// as long as callers pass attributes in canonical order: no whitespace between
/// elements, explicit end tags, `<`, `>` and `&` escaped in text, attribute
/// values escaped the same way.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    pub fn with_declaration() -> Result<Self, EncodeError> {
        let mut w = Self::new();
        w.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(w)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }

    pub fn into_string(self) -> Result<String, EncodeError> {
        String::from_utf8(self.into_bytes())
            .map_err(|e| EncodeError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, EncodeError> {
        self.start_element_with_attrs(name, &[])
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, EncodeError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute(Attribute {
                key: QName(k.as_bytes()),
                value: match escape_attribute(v) {
                    Cow::Borrowed(v) => Cow::Borrowed(v.as_bytes()),
                    Cow::Owned(v) => Cow::Owned(v.into_bytes()),
                },
            });
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, EncodeError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    /// An element without content, written as a start/end pair.
    pub fn empty_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, EncodeError> {
        self.start_element_with_attrs(name, attrs)?;
        self.end_element(name)
    }

    pub fn text(&mut self, text: &str) -> Result<&mut Self, EncodeError> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, EncodeError> {
        self.text_element_with_attrs(name, text, &[])
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, EncodeError> {
        self.start_element_with_attrs(name, attrs)?;
        self.text(text)?;
        self.end_element(name)
    }

    /// Splice in an already serialized fragment.
    pub fn raw(&mut self, fragment: &[u8]) -> Result<&mut Self, EncodeError> {
        self.writer.get_mut().write_all(fragment).map_err(xml_io)?;
        Ok(self)
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

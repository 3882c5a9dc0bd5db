//! XML rendering and parsing
//!
//! Wire documents travel as UTF-8 XML. Rendering walks the ordered tree;
//! parsing is event-driven and rejects anything the protocol never
//! produces (mixed content, bare top-level text). Attributes are ignored
//! on input — the command schemas are element-only.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{OciError, Result};
use super::document::{WireDocument, WireElement, WireValue};

/// Render a wire document to XML bytes
pub fn to_xml(document: &WireDocument) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_err)?;
    write_element(&mut writer, &document.root)?;

    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &WireElement) -> Result<()> {
    match &element.value {
        WireValue::Text(text) if text.is_empty() => {
            writer
                .write_event(Event::Empty(BytesStart::new(element.name.as_str())))
                .map_err(write_err)?;
        }
        WireValue::Text(text) => {
            writer
                .write_event(Event::Start(BytesStart::new(element.name.as_str())))
                .map_err(write_err)?;
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(element.name.as_str())))
                .map_err(write_err)?;
        }
        WireValue::Children(children) if children.is_empty() => {
            writer
                .write_event(Event::Empty(BytesStart::new(element.name.as_str())))
                .map_err(write_err)?;
        }
        WireValue::Children(children) => {
            writer
                .write_event(Event::Start(BytesStart::new(element.name.as_str())))
                .map_err(write_err)?;
            for child in children {
                write_element(writer, child)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(element.name.as_str())))
                .map_err(write_err)?;
        }
    }
    Ok(())
}

fn write_err<E: std::fmt::Display>(e: E) -> OciError {
    OciError::MalformedDocument(format!("XML write failed: {}", e))
}

/// Parse XML bytes into a wire document
pub fn from_xml(bytes: &[u8]) -> Result<WireDocument> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| OciError::MalformedDocument(format!("not UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    // Elements under construction; completed children attach to the top
    let mut stack: Vec<PartialElement> = Vec::new();
    let mut root: Option<WireElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| OciError::MalformedDocument(format!("XML parse failed: {}", e)))?;

        match event {
            Event::Start(start) => {
                stack.push(PartialElement::new(element_name(&start)?));
            }
            Event::Empty(start) => {
                let element = WireElement::text(element_name(&start)?, "");
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| OciError::MalformedDocument(format!("bad text: {}", e)))?;
                let current = stack.last_mut().ok_or_else(|| {
                    OciError::MalformedDocument("text outside the root element".to_string())
                })?;
                current.set_text(text.into_owned())?;
            }
            Event::CData(cdata) => {
                let text = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(|e| OciError::MalformedDocument(format!("bad CDATA: {}", e)))?;
                let current = stack.last_mut().ok_or_else(|| {
                    OciError::MalformedDocument("CDATA outside the root element".to_string())
                })?;
                current.set_text(text)?;
            }
            Event::End(_) => {
                let finished = stack.pop().ok_or_else(|| {
                    OciError::MalformedDocument("unbalanced close tag".to_string())
                })?;
                attach(&mut stack, &mut root, finished.finish())?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and DTDs
            // carry no payload data
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(OciError::MalformedDocument(
            "document ended with unclosed elements".to_string(),
        ));
    }

    root.map(|root| WireDocument { root })
        .ok_or_else(|| OciError::MalformedDocument("empty document".to_string()))
}

fn element_name(start: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(start.name().as_ref())
        .map(|s| s.to_string())
        .map_err(|e| OciError::MalformedDocument(format!("bad element name: {}", e)))
}

fn attach(
    stack: &mut [PartialElement],
    root: &mut Option<WireElement>,
    element: WireElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None => {
            if root.is_some() {
                return Err(OciError::MalformedDocument(
                    "multiple root elements".to_string(),
                ));
            }
            *root = Some(element);
            Ok(())
        }
    }
}

/// An open element whose content is still arriving
struct PartialElement {
    name: String,
    text: Option<String>,
    children: Vec<WireElement>,
}

impl PartialElement {
    fn new(name: String) -> Self {
        Self {
            name,
            text: None,
            children: Vec::new(),
        }
    }

    fn set_text(&mut self, text: String) -> Result<()> {
        if !self.children.is_empty() {
            return Err(OciError::MalformedDocument(format!(
                "{}: mixed text and element content",
                self.name
            )));
        }
        match &mut self.text {
            // Adjacent text runs (entity boundaries) concatenate
            Some(existing) => existing.push_str(&text),
            None => self.text = Some(text),
        }
        Ok(())
    }

    fn push_child(&mut self, child: WireElement) -> Result<()> {
        if self.text.is_some() {
            return Err(OciError::MalformedDocument(format!(
                "{}: mixed text and element content",
                self.name
            )));
        }
        self.children.push(child);
        Ok(())
    }

    fn finish(self) -> WireElement {
        match self.text {
            Some(text) => WireElement::text(self.name, text),
            None if self.children.is_empty() => WireElement::text(self.name, ""),
            None => WireElement::parent(self.name, self.children),
        }
    }
}

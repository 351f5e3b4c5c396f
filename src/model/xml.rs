//! Owned XML element tree for package parts.
//!
//! Parts are parsed with `quick-xml` into a small mutable tree so that whole
//! nodes can be moved between documents without losing run-level markup.
//! Qualified names are kept verbatim (`w:p`, `w:rPr`); WordprocessingML
//! producers use the conventional prefixes, so lookups go by qualified name.

use crate::error::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in an XML part.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Child element
    Element(XmlElement),
    /// Character data (unescaped)
    Text(String),
    /// CDATA section
    CData(String),
    /// Comment (raw)
    Comment(String),
    /// Processing instruction (raw)
    Instruction(String),
}

impl XmlNode {
    /// Borrow the element if this node is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutably borrow the element if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name (e.g. `w:p`)
    pub name: String,

    /// Attributes in document order (unescaped values)
    pub attributes: Vec<(String, String)>,

    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: append a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Check the qualified name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Get an attribute value by qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Iterate over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Iterate mutably over child elements.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.name == name)
    }

    /// First child element with the given name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// Check whether a direct child element exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Remove all direct children with the given name; returns how many.
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(el) if el.name == name));
        before - self.children.len()
    }

    /// Get the named child, appending an empty one if absent.
    pub fn ensure_child(&mut self, name: &str) -> &mut XmlElement {
        let pos = match self.position_of(name) {
            Some(pos) => pos,
            None => {
                self.children.push(XmlNode::Element(XmlElement::new(name)));
                self.children.len() - 1
            }
        };
        self.element_at_mut(pos)
    }

    /// Get the named child, inserting it at its schema position if absent.
    ///
    /// `order` lists sibling names in the sequence the schema requires.
    /// Siblings not listed are treated as coming after every listed name.
    pub fn ensure_child_ordered(&mut self, name: &str, order: &[&str]) -> &mut XmlElement {
        let pos = match self.position_of(name) {
            Some(pos) => pos,
            None => self.insert_ordered(XmlElement::new(name), order),
        };
        self.element_at_mut(pos)
    }

    /// Insert a child element at its schema position; returns the node index.
    pub fn insert_ordered(&mut self, child: XmlElement, order: &[&str]) -> usize {
        let rank = |name: &str| order.iter().position(|n| *n == name).unwrap_or(order.len());
        let child_rank = rank(&child.name);
        let pos = self
            .children
            .iter()
            .position(|node| match node {
                XmlNode::Element(el) => rank(&el.name) > child_rank,
                _ => false,
            })
            .unwrap_or(self.children.len());
        self.children.insert(pos, XmlNode::Element(child));
        pos
    }

    /// Replace (or insert at schema position) a named child.
    pub fn replace_child_ordered(&mut self, child: XmlElement, order: &[&str]) {
        match self.position_of(&child.name) {
            Some(pos) => self.children[pos] = XmlNode::Element(child),
            None => {
                self.insert_ordered(child, order);
            }
        }
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.name == name))
    }

    fn element_at_mut(&mut self, pos: usize) -> &mut XmlElement {
        match &mut self.children[pos] {
            XmlNode::Element(el) => el,
            // position_of / insert_ordered only ever yield element slots
            _ => unreachable!("node at {pos} is not an element"),
        }
    }

    /// All descendant elements (excluding self) with the given name, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        collect_named(self, name, &mut out);
        out
    }

    /// Check whether any descendant (excluding self) satisfies the predicate.
    pub fn any_descendant<F: Fn(&XmlElement) -> bool + Copy>(&self, pred: F) -> bool {
        self.elements()
            .any(|el| pred(el) || el.any_descendant(pred))
    }

    /// Visit every descendant element with the given name, mutably.
    pub fn for_each_named_mut<F: FnMut(&mut XmlElement)>(&mut self, name: &str, f: &mut F) {
        for el in self.elements_mut() {
            if el.name == name {
                f(el);
            }
            el.for_each_named_mut(name, f);
        }
    }

    /// Concatenated text of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    /// Check whether whitespace in this element is significant.
    fn preserves_space(&self) -> bool {
        matches!(self.local_name(), "t" | "instrText" | "delText")
            || self.attr("xml:space") == Some("preserve")
    }
}

fn collect_named<'a>(el: &'a XmlElement, name: &str, out: &mut Vec<&'a XmlElement>) {
    for child in el.elements() {
        if child.name == name {
            out.push(child);
        }
        collect_named(child, name, out);
    }
}

/// Strip the namespace prefix from a qualified name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Whether the source carried an XML declaration
    pub declaration: bool,

    /// Root element
    pub root: XmlElement,
}

impl XmlDocument {
    /// Wrap a root element; the declaration is emitted on write.
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: true,
            root,
        }
    }

    /// Parse an XML part from text.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        let mut declaration = false;

        loop {
            match reader.read_event()? {
                Event::Decl(_) => declaration = true,
                Event::Start(e) => stack.push(start_element(&e)?),
                Event::Empty(e) => {
                    let el = start_element(&e)?;
                    attach(&mut stack, &mut root, el);
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, el);
                }
                Event::Text(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape()?.into_owned();
                        if parent.preserves_space() || !text.trim().is_empty() {
                            parent.children.push(XmlNode::Text(text));
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(XmlNode::CData(text));
                    }
                }
                Event::Comment(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e).into_owned();
                        parent.children.push(XmlNode::Comment(text));
                    }
                }
                Event::PI(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e).into_owned();
                        parent.children.push(XmlNode::Instruction(text));
                    }
                }
                Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;
        Ok(Self { declaration, root })
    }

    /// Parse an XML part from bytes (UTF-8).
    pub fn parse_bytes(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|e| Error::Xml(e.to_string()))?;
        Self::parse(text.trim_start_matches('\u{feff}'))
    }

    /// Serialize back to UTF-8 bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
            writer.get_mut().extend_from_slice(b"\r\n");
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }

    /// Serialize back to a string.
    pub fn to_xml_string(&self) -> Result<String> {
        String::from_utf8(self.to_bytes()?).map_err(|e| Error::Xml(e.to_string()))
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| Error::Xml(err.to_string()))?
        .to_string();
    let mut el = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| Error::Xml(err.to_string()))?
            .to_string();
        let value = attr.unescape_value()?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(el)),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            XmlNode::Element(inner) => write_element(writer, inner)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
            XmlNode::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
            XmlNode::Instruction(text) => {
                writer.write_event(Event::PI(BytesText::from_escaped(text.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}

//! The editable word-processing document.

use super::page::{BlockKind, BlockSnapshot};
use super::paragraph::{self, new_paragraph, page_break_run, paragraph_text, P};
use super::section::{
    default_section, reference_id, set_reference, HeaderFooterKind, PartKind, SECT_PR,
};
use super::table::{new_table, TBL};
use super::xml::{XmlDocument, XmlElement, XmlNode};
use crate::error::{Error, Result};
use crate::package::{
    relative_target, ContentTypes, Package, Relationships, CT_FOOTER, CT_HEADER,
    CT_MAIN_DOCUMENT, REL_FOOTER, REL_HEADER, REL_OFFICE_DOCUMENT,
};
use log::debug;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

/// WordprocessingML main namespace.
pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Office relationships namespace.
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
/// VML namespace.
pub const NS_V: &str = "urn:schemas-microsoft-com:vml";
/// Office VML extensions namespace.
pub const NS_O: &str = "urn:schemas-microsoft-com:office:office";
/// Word VML extensions namespace.
pub const NS_W10: &str = "urn:schemas-microsoft-com:office:word";

const BODY: &str = "w:body";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

static EMPTY_BODY: XmlElement = XmlElement {
    name: String::new(),
    attributes: Vec::new(),
    children: Vec::new(),
};

/// Namespace declarations put on generated part roots.
pub fn namespace_attrs() -> Vec<(String, String)> {
    [("w", NS_W), ("r", NS_R), ("v", NS_V), ("o", NS_O), ("w10", NS_W10)]
        .iter()
        .map(|(prefix, ns)| (format!("xmlns:{}", prefix), ns.to_string()))
        .collect()
}

/// A loaded `.docx` document.
///
/// The main part is parsed eagerly; headers and footers are parsed on first
/// access and written back on save. Everything else in the package is kept
/// as raw bytes.
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    main_part: String,
    main: XmlDocument,
    parts: BTreeMap<String, XmlDocument>,
}

impl Document {
    /// Create a blank single-section document.
    pub fn new() -> Self {
        let mut root = XmlElement::new("w:document");
        root.attributes = namespace_attrs();
        let root = root.with_child(XmlElement::new(BODY).with_child(default_section()));

        let mut package = Package::new();
        let mut types = XmlElement::new("Types")
            .with_attr("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types");
        types.push(
            XmlElement::new("Default")
                .with_attr("Extension", "rels")
                .with_attr("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        );
        types.push(
            XmlElement::new("Default")
                .with_attr("Extension", "xml")
                .with_attr("ContentType", "application/xml"),
        );
        types.push(
            XmlElement::new("Override")
                .with_attr("PartName", format!("/{}", DEFAULT_MAIN_PART))
                .with_attr("ContentType", CT_MAIN_DOCUMENT),
        );
        let root_rels = XmlElement::new("Relationships")
            .with_attr("xmlns", "http://schemas.openxmlformats.org/package/2006/relationships")
            .with_child(
                XmlElement::new("Relationship")
                    .with_attr("Id", "rId1")
                    .with_attr("Type", REL_OFFICE_DOCUMENT)
                    .with_attr("Target", DEFAULT_MAIN_PART),
            );

        // Generated trees always serialize
        for (name, tree) in [
            (crate::package::CONTENT_TYPES_PART, types),
            ("_rels/.rels", root_rels),
        ] {
            if let Ok(bytes) = XmlDocument::new(tree).to_bytes() {
                package.set(name, bytes);
            }
        }

        Self {
            package,
            main_part: DEFAULT_MAIN_PART.to_string(),
            main: XmlDocument::new(root),
            parts: BTreeMap::new(),
        }
    }

    /// Open a document from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening document {}", path.display());
        Self::from_package(Package::open(path)?)
    }

    /// Open a document from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(data)?)
    }

    /// Wrap an opened package.
    pub fn from_package(package: Package) -> Result<Self> {
        let root_rels = Relationships::load(&package, "")?;
        let main_part = match root_rels.find_by_type(REL_OFFICE_DOCUMENT) {
            Some(rel) => crate::package::resolve_target("", &rel.target),
            None => DEFAULT_MAIN_PART.to_string(),
        };
        let main = XmlDocument::parse_bytes(package.require(&main_part)?)?;
        if !main.root.has_child(BODY) {
            return Err(Error::MissingBody);
        }
        Ok(Self {
            package,
            main_part,
            main,
            parts: BTreeMap::new(),
        })
    }

    /// Write every parsed part back into the package.
    pub fn flush(&mut self) -> Result<()> {
        self.package.set(self.main_part.as_str(), self.main.to_bytes()?);
        for (name, doc) in &self.parts {
            self.package.set(name.as_str(), doc.to_bytes()?);
        }
        Ok(())
    }

    /// Serialize to `.docx` bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    /// Save to a file.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.flush()?;
        self.package.save(path)?;
        debug!("Saved document to {}", path.display());
        Ok(())
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The underlying package, mutably.
    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Root `w:document` element.
    pub fn root(&self) -> &XmlElement {
        &self.main.root
    }

    /// Root `w:document` element, mutably.
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.main.root
    }

    /// The `w:body` element.
    pub fn body(&self) -> &XmlElement {
        self.main.root.child(BODY).unwrap_or(&EMPTY_BODY)
    }

    /// The `w:body` element, mutably.
    pub fn body_mut(&mut self) -> &mut XmlElement {
        self.main.root.ensure_child(BODY)
    }

    // ---- blocks ----

    fn block_positions(&self) -> Vec<usize> {
        self.body()
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                XmlNode::Element(el) if el.name != SECT_PR => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Body-level blocks in order, excluding the trailing section properties.
    pub fn blocks(&self) -> impl Iterator<Item = &XmlElement> {
        self.body().elements().filter(|el| el.name != SECT_PR)
    }

    /// Number of body blocks.
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// Block by index.
    pub fn block(&self, index: usize) -> Option<&XmlElement> {
        self.blocks().nth(index)
    }

    /// Block by index, mutably.
    pub fn block_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        self.body_mut()
            .elements_mut()
            .filter(|el| el.name != SECT_PR)
            .nth(index)
    }

    /// Snapshot every block (index, kind, text, page break).
    pub fn snapshot(&self) -> Vec<BlockSnapshot> {
        self.blocks()
            .enumerate()
            .map(|(index, el)| {
                let kind = match el.name.as_str() {
                    P => BlockKind::Paragraph,
                    TBL => BlockKind::Table,
                    _ => BlockKind::Other,
                };
                BlockSnapshot {
                    index,
                    kind,
                    text: if kind == BlockKind::Paragraph {
                        paragraph_text(el)
                    } else {
                        String::new()
                    },
                    page_break: paragraph::has_page_break(el),
                }
            })
            .collect()
    }

    /// Text of every body-level paragraph, in order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.blocks()
            .filter(|el| el.name == P)
            .map(paragraph_text)
            .collect()
    }

    /// Body-level tables, in order.
    pub fn tables(&self) -> Vec<&XmlElement> {
        self.blocks().filter(|el| el.name == TBL).collect()
    }

    /// Remove the blocks in `range` (clamped to the body); returns how many were removed.
    ///
    /// Section properties are never removed.
    pub fn remove_blocks(&mut self, range: Range<usize>) -> usize {
        let positions = self.block_positions();
        let end = range.end.min(positions.len());
        if range.start >= end {
            return 0;
        }
        let first = positions[range.start];
        let last = positions[end - 1];

        let body = self.body_mut();
        let mut i = 0;
        body.children.retain(|node| {
            let pos = i;
            i += 1;
            let in_range = pos >= first && pos <= last;
            !in_range || matches!(node, XmlNode::Element(el) if el.name == SECT_PR)
        });
        end - range.start
    }

    /// Remove every block from `start` to the end of the body.
    pub fn truncate_blocks(&mut self, start: usize) -> usize {
        self.remove_blocks(start..usize::MAX)
    }

    /// Remove a single block.
    pub fn remove_block(&mut self, index: usize) -> Option<XmlElement> {
        let pos = *self.block_positions().get(index)?;
        match self.body_mut().children.remove(pos) {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Append a block before the trailing section properties.
    pub fn append_block(&mut self, block: XmlElement) -> usize {
        let index = self.block_count();
        let body = self.body_mut();
        let sect_pos = body
            .children
            .iter()
            .rposition(|node| matches!(node, XmlNode::Element(el) if el.name == SECT_PR));
        match sect_pos {
            Some(pos) => body.children.insert(pos, XmlNode::Element(block)),
            None => body.push(block),
        }
        index
    }

    /// Insert a block at `index`, or append when past the end.
    pub fn insert_block(&mut self, index: usize, block: XmlElement) -> usize {
        match self.block_positions().get(index).copied() {
            Some(pos) => {
                self.body_mut().children.insert(pos, XmlNode::Element(block));
                index
            }
            None => self.append_block(block),
        }
    }

    /// Detach every block from the body, leaving section properties behind.
    pub fn take_blocks(&mut self) -> Vec<XmlElement> {
        let body = self.body_mut();
        let mut taken = Vec::new();
        let mut kept = Vec::new();
        for node in std::mem::take(&mut body.children) {
            match node {
                XmlNode::Element(el) if el.name != SECT_PR => taken.push(el),
                other => kept.push(other),
            }
        }
        body.children = kept;
        taken
    }

    /// Append a paragraph; returns its block index.
    pub fn add_paragraph(&mut self, text: &str) -> usize {
        self.append_block(new_paragraph(text))
    }

    /// Append a manual page break to the end of the paragraph at `index`.
    pub fn add_break_to(&mut self, index: usize) -> bool {
        match self.block_mut(index) {
            Some(block) if block.name == P => {
                block.push(page_break_run());
                true
            }
            _ => false,
        }
    }

    /// Append a paragraph holding only a page break; returns its block index.
    pub fn add_page_break(&mut self) -> usize {
        self.append_block(XmlElement::new(P).with_child(page_break_run()))
    }

    /// Append an empty table; returns its block index.
    pub fn add_table(&mut self, rows: usize, cols: usize) -> usize {
        self.append_block(new_table(rows, cols))
    }

    // ---- sections ----

    /// Section properties in body order.
    pub fn sections(&self) -> Vec<&XmlElement> {
        self.body()
            .elements()
            .filter_map(|el| {
                if el.name == SECT_PR {
                    Some(el)
                } else if el.name == P {
                    el.child("w:pPr").and_then(|props| props.child(SECT_PR))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.sections().len()
    }

    /// Section properties by index, mutably.
    pub fn section_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        self.body_mut()
            .elements_mut()
            .filter_map(|el| {
                if el.name == SECT_PR {
                    Some(el)
                } else if el.name == P {
                    el.child_mut("w:pPr").and_then(|props| props.child_mut(SECT_PR))
                } else {
                    None
                }
            })
            .nth(index)
    }

    /// Section properties by index, creating the final section if the body has none.
    pub fn ensure_section(&mut self, index: usize) -> Result<&mut XmlElement> {
        if self.section_count() == 0 {
            self.body_mut().push(default_section());
        }
        let count = self.section_count();
        if index >= count {
            return Err(Error::SectionOutOfRange(index, count));
        }
        self.section_mut(index)
            .ok_or(Error::SectionOutOfRange(index, count))
    }

    /// Part name of the header or footer used by a section.
    ///
    /// Sections without their own reference inherit from the previous one.
    pub fn header_footer_part(
        &self,
        section: usize,
        part: PartKind,
        kind: HeaderFooterKind,
    ) -> Result<Option<String>> {
        let sections = self.sections();
        let upto = section.min(sections.len().saturating_sub(1));
        let r_id = sections
            .iter()
            .take(upto + 1)
            .rev()
            .find_map(|sect| reference_id(sect, part, kind));
        let Some(r_id) = r_id else {
            return Ok(None);
        };
        Ok(self.relationships()?.part_name(r_id))
    }

    /// Create a header or footer part for a section and point the section at it.
    ///
    /// Returns the new part name.
    pub fn add_header_footer(
        &mut self,
        section: usize,
        part: PartKind,
        kind: HeaderFooterKind,
        content: Vec<XmlElement>,
    ) -> Result<String> {
        let mut root = XmlElement::new(part.root_element());
        root.attributes = namespace_attrs();
        for el in content {
            root.push(el);
        }

        let name = self.package.unique_name("word", part.stem(), "xml");
        let tree = XmlDocument::new(root);
        self.package.set(name.as_str(), tree.to_bytes()?);
        self.parts.insert(name.clone(), tree);

        let mut types = ContentTypes::load(&self.package)?;
        let content_type = match part {
            PartKind::Header => CT_HEADER,
            PartKind::Footer => CT_FOOTER,
        };
        types.set_override(&name, content_type);
        types.store(&mut self.package)?;

        let mut rels = self.relationships()?;
        let rel_type = match part {
            PartKind::Header => REL_HEADER,
            PartKind::Footer => REL_FOOTER,
        };
        let r_id = rels.add(rel_type, &relative_target(&self.main_part, &name), false);
        rels.store(&mut self.package)?;

        let sect = self.ensure_section(section)?;
        set_reference(sect, part, kind, &r_id);
        debug!("Added {} {} for section {}", kind.as_ooxml(), name, section);
        Ok(name)
    }

    /// Replace the content of a section's own header or footer part.
    ///
    /// Reuses the part the section already references for `kind`, so
    /// repeated calls do not add parts. Falls back to
    /// [`add_header_footer`](Self::add_header_footer) when there is none.
    pub fn replace_header_footer(
        &mut self,
        section: usize,
        part: PartKind,
        kind: HeaderFooterKind,
        content: Vec<XmlElement>,
    ) -> Result<String> {
        let own = self
            .sections()
            .get(section)
            .and_then(|sect| reference_id(sect, part, kind))
            .map(str::to_string);
        let existing = match own {
            Some(r_id) => self.relationships()?.part_name(&r_id),
            None => None,
        };
        if let Some(name) = existing {
            if let Some(tree) = self.part_mut(&name)? {
                if tree.root.name == part.root_element() {
                    tree.root.children = content.into_iter().map(XmlNode::Element).collect();
                    debug!("Replaced {} {} for section {}", kind.as_ooxml(), name, section);
                    return Ok(name);
                }
            }
        }
        self.add_header_footer(section, part, kind, content)
    }

    // ---- parts ----

    /// Parsed auxiliary part (header, footer, ...), parsed on first access.
    pub fn part_mut(&mut self, name: &str) -> Result<Option<&mut XmlDocument>> {
        if !self.parts.contains_key(name) {
            let Some(data) = self.package.get(name) else {
                return Ok(None);
            };
            let tree = XmlDocument::parse_bytes(data)?;
            self.parts.insert(name.to_string(), tree);
        }
        Ok(self.parts.get_mut(name))
    }

    /// Current state of an auxiliary part, without caching it.
    pub fn part(&self, name: &str) -> Result<Option<XmlDocument>> {
        if let Some(tree) = self.parts.get(name) {
            return Ok(Some(tree.clone()));
        }
        match self.package.get(name) {
            Some(data) => Ok(Some(XmlDocument::parse_bytes(data)?)),
            None => Ok(None),
        }
    }

    /// Relationships of the main part.
    pub fn relationships(&self) -> Result<Relationships> {
        Relationships::load(&self.package, &self.main_part)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_document_round_trip() {
        let mut doc = Document::new();
        doc.add_paragraph("Hello");
        doc.add_table(1, 2);

        let bytes = doc.to_bytes().unwrap();
        let reopened = Document::from_bytes(&bytes).unwrap();
        assert_eq!(reopened.paragraph_texts(), vec!["Hello"]);
        assert_eq!(reopened.tables().len(), 1);
        assert_eq!(reopened.section_count(), 1);
    }

    #[test]
    fn test_blocks_exclude_section_properties() {
        let mut doc = Document::new();
        doc.add_paragraph("a");
        doc.add_paragraph("b");
        assert_eq!(doc.block_count(), 2);
        let last = doc.body().elements().last().unwrap();
        assert_eq!(last.name, SECT_PR);
    }

    #[test]
    fn test_remove_blocks_keeps_section() {
        let mut doc = Document::new();
        for text in ["a", "b", "c", "d"] {
            doc.add_paragraph(text);
        }
        assert_eq!(doc.remove_blocks(1..3), 2);
        assert_eq!(doc.paragraph_texts(), vec!["a", "d"]);
        assert_eq!(doc.truncate_blocks(1), 1);
        assert_eq!(doc.paragraph_texts(), vec!["a"]);
        assert_eq!(doc.truncate_blocks(5), 0);
        assert_eq!(doc.section_count(), 1);
    }

    #[test]
    fn test_insert_and_remove_block() {
        let mut doc = Document::new();
        doc.add_paragraph("a");
        doc.add_paragraph("c");
        doc.insert_block(1, new_paragraph("b"));
        assert_eq!(doc.paragraph_texts(), vec!["a", "b", "c"]);

        let removed = doc.remove_block(0).unwrap();
        assert_eq!(paragraph_text(&removed), "a");
        assert!(doc.remove_block(9).is_none());
    }

    #[test]
    fn test_take_blocks() {
        let mut doc = Document::new();
        doc.add_paragraph("x");
        doc.add_page_break();
        let taken = doc.take_blocks();
        assert_eq!(taken.len(), 2);
        assert_eq!(doc.block_count(), 0);
        assert_eq!(doc.section_count(), 1);
    }

    #[test]
    fn test_snapshot_marks_breaks() {
        let mut doc = Document::new();
        let first = doc.add_paragraph("one");
        doc.add_break_to(first);
        doc.add_table(1, 1);

        let snapshot = doc.snapshot();
        assert!(snapshot[0].page_break);
        assert_eq!(snapshot[0].text, "one");
        assert!(snapshot[1].is_table());
    }

    #[test]
    fn test_add_footer_part() {
        let mut doc = Document::new();
        let name = doc
            .add_header_footer(0, PartKind::Footer, HeaderFooterKind::Default, Vec::new())
            .unwrap();
        assert_eq!(name, "word/footer1.xml");
        assert_eq!(
            doc.header_footer_part(0, PartKind::Footer, HeaderFooterKind::Default)
                .unwrap()
                .as_deref(),
            Some("word/footer1.xml")
        );

        let bytes = doc.to_bytes().unwrap();
        let reopened = Document::from_bytes(&bytes).unwrap();
        let types = ContentTypes::load(reopened.package()).unwrap();
        assert_eq!(
            types.content_type_of("word/footer1.xml").as_deref(),
            Some(CT_FOOTER)
        );
        assert!(reopened.part("word/footer1.xml").unwrap().is_some());
    }

    #[test]
    fn test_section_out_of_range() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.ensure_section(3),
            Err(Error::SectionOutOfRange(3, 1))
        ));
    }

    #[test]
    fn test_missing_body_is_an_error() {
        let mut doc = Document::new();
        doc.root_mut().remove_children("w:body");
        let bytes = doc.to_bytes().unwrap();
        assert!(matches!(Document::from_bytes(&bytes), Err(Error::MissingBody)));
    }
}

//! Package relationships (`_rels/*.rels` parts).

use super::Package;
use crate::error::Result;
use crate::model::{XmlDocument, XmlElement};

const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Main document relationship (from `_rels/.rels`).
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
/// Header part relationship.
pub const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
/// Footer part relationship.
pub const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
/// Image part relationship.
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
/// External hyperlink relationship.
pub const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// One relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id (e.g. `rId4`)
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target as written in the part (relative to the source part)
    pub target: String,
    /// Whether `TargetMode="External"`
    pub external: bool,
}

/// Relationships of one source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    source_part: String,
    doc: XmlDocument,
}

impl Relationships {
    /// Load the relationships of `source_part`, or an empty set if none exist.
    pub fn load(package: &Package, source_part: &str) -> Result<Self> {
        let doc = match package.get(&rels_part_for(source_part)) {
            Some(data) => XmlDocument::parse_bytes(data)?,
            None => XmlDocument::new(
                XmlElement::new("Relationships").with_attr("xmlns", NS_RELATIONSHIPS),
            ),
        };
        Ok(Self {
            source_part: source_part.to_string(),
            doc,
        })
    }

    /// Write the relationships back into the package.
    pub fn store(&self, package: &mut Package) -> Result<()> {
        package.set(rels_part_for(&self.source_part), self.doc.to_bytes()?);
        Ok(())
    }

    /// All relationships in document order.
    pub fn all(&self) -> Vec<Relationship> {
        self.doc
            .root
            .elements()
            .filter(|el| el.local_name() == "Relationship")
            .map(|el| Relationship {
                id: el.attr("Id").unwrap_or_default().to_string(),
                rel_type: el.attr("Type").unwrap_or_default().to_string(),
                target: el.attr("Target").unwrap_or_default().to_string(),
                external: el.attr("TargetMode") == Some("External"),
            })
            .collect()
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.all().into_iter().find(|rel| rel.id == id)
    }

    /// First relationship of the given type.
    pub fn find_by_type(&self, rel_type: &str) -> Option<Relationship> {
        self.all().into_iter().find(|rel| rel.rel_type == rel_type)
    }

    /// Resolve a relationship id to a package part name.
    pub fn part_name(&self, id: &str) -> Option<String> {
        self.get(id)
            .filter(|rel| !rel.external)
            .map(|rel| resolve_target(&self.source_part, &rel.target))
    }

    /// Add a relationship and return its new id.
    pub fn add(&mut self, rel_type: &str, target: &str, external: bool) -> String {
        let id = self.next_id();
        let mut el = XmlElement::new("Relationship")
            .with_attr("Id", id.as_str())
            .with_attr("Type", rel_type)
            .with_attr("Target", target);
        if external {
            el.set_attr("TargetMode", "External");
        }
        self.doc.root.push(el);
        id
    }

    /// Smallest `rIdN` not yet used.
    fn next_id(&self) -> String {
        let max = self
            .all()
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }
}

/// Relationship part name for a source part.
///
/// `word/document.xml` → `word/_rels/document.xml.rels`, and the package
/// root (empty string) → `_rels/.rels`.
pub fn rels_part_for(source_part: &str) -> String {
    match source_part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if source_part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", source_part),
    }
}

/// Resolve a relationship target against its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Express `part_name` relative to the directory of `source_part`.
pub fn relative_target(source_part: &str, part_name: &str) -> String {
    match source_part.rsplit_once('/') {
        Some((dir, _)) => match part_name.strip_prefix(&format!("{}/", dir)) {
            Some(rest) => rest.to_string(),
            None => format!("/{}", part_name),
        },
        None => part_name.to_string(),
    }
}

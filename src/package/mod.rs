//! OPC package (zip container) handling.
//!
//! The package keeps every zip entry as raw bytes in archive order. Parts
//! that the journal pipeline edits are parsed into [`crate::model::XmlDocument`]
//! by the document layer and written back here before saving.

mod content_types;
mod rels;

pub use content_types::{
    ContentTypes, CT_FOOTER, CT_HEADER, CT_MAIN_DOCUMENT, CONTENT_TYPES_PART,
};
pub(crate) use content_types::image_content_type;
pub use rels::{
    rels_part_for, relative_target, resolve_target, Relationship, Relationships, REL_FOOTER,
    REL_HEADER, REL_HYPERLINK, REL_IMAGE, REL_OFFICE_DOCUMENT,
};

use crate::detect::{detect_container_from_bytes, ContainerKind};
use crate::error::{Error, Result};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

/// A single zip entry.
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
}

/// Ordered set of package parts.
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<PackageEntry>,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a package from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Open a package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if detect_container_from_bytes(data)? != ContainerKind::Zip {
            return Err(Error::NotDocx);
        }
        Self::from_reader(Cursor::new(data))
    }

    /// Open a package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry { name, data });
        }

        let package = Self { entries };
        if !package.contains(CONTENT_TYPES_PART) {
            return Err(Error::NotDocx);
        }
        Ok(package)
    }

    /// Serialize the package to zip bytes.
    ///
    /// `[Content_Types].xml` is written first, media parts are stored
    /// uncompressed and everything else is deflated.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        let ordered = self
            .entries
            .iter()
            .filter(|e| e.name == CONTENT_TYPES_PART)
            .chain(self.entries.iter().filter(|e| e.name != CONTENT_TYPES_PART));

        for entry in ordered {
            let options = if entry.name.contains("/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Get the raw bytes of a part.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Get a part, failing if it does not exist.
    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    /// Check if a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Insert or replace a part.
    pub fn set(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry { name, data }),
        }
    }

    /// Remove a part.
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        let pos = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(pos).data)
    }

    /// Iterate over part names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the package has no parts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick an unused part name like `word/footer3.xml`.
    pub fn unique_name(&self, dir: &str, stem: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{}/{}{}.{}", dir, stem, n, ext))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| format!("{}/{}.{}", dir, stem, ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Package {
        let mut package = Package::new();
        package.set(CONTENT_TYPES_PART, b"<Types/>".to_vec());
        package.set("word/document.xml", b"<w:document/>".to_vec());
        package
    }

    #[test]
    fn test_round_trip_through_zip() {
        let mut package = sample();
        package.set("word/media/image1.png", vec![0x89, 0x50, 0x4e, 0x47]);

        let bytes = package.to_bytes().unwrap();
        let reopened = Package::from_bytes(&bytes).unwrap();
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.get("word/document.xml"), Some(&b"<w:document/>"[..]));
        assert_eq!(reopened.names().next(), Some(CONTENT_TYPES_PART));
    }

    #[test]
    fn test_missing_content_types_is_not_docx() {
        let mut package = Package::new();
        package.set("word/document.xml", b"<w:document/>".to_vec());
        let bytes = package.to_bytes().unwrap();
        assert!(matches!(Package::from_bytes(&bytes), Err(Error::NotDocx)));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(Package::from_bytes(b"plain text"), Err(Error::NotDocx)));
    }

    #[test]
    fn test_unique_name() {
        let mut package = sample();
        assert_eq!(package.unique_name("word", "footer", "xml"), "word/footer1.xml");
        package.set("word/footer1.xml", Vec::new());
        assert_eq!(package.unique_name("word", "footer", "xml"), "word/footer2.xml");
    }

    #[test]
    fn test_require_missing_part() {
        let package = sample();
        assert!(matches!(
            package.require("word/styles.xml"),
            Err(Error::MissingPart(_))
        ));
    }
}

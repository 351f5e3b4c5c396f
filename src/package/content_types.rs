//! `[Content_Types].xml` handling.

use super::Package;
use crate::error::Result;
use crate::model::XmlDocument;
use crate::model::XmlElement;

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Main document part content type.
pub const CT_MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
/// Header part content type.
pub const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
/// Footer part content type.
pub const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

/// Content type registry of a package.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    doc: XmlDocument,
}

impl ContentTypes {
    /// Load from the package, or start an empty registry.
    pub fn load(package: &Package) -> Result<Self> {
        let doc = match package.get(CONTENT_TYPES_PART) {
            Some(data) => XmlDocument::parse_bytes(data)?,
            None => XmlDocument::new(XmlElement::new("Types").with_attr("xmlns", NS_CONTENT_TYPES)),
        };
        Ok(Self { doc })
    }

    /// Write back into the package.
    pub fn store(&self, package: &mut Package) -> Result<()> {
        package.set(CONTENT_TYPES_PART, self.doc.to_bytes()?);
        Ok(())
    }

    /// Check for a `Default` entry for an extension.
    pub fn has_default(&self, extension: &str) -> bool {
        self.doc.root.elements().any(|el| {
            el.local_name() == "Default"
                && el
                    .attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
    }

    /// Add a `Default` entry unless one exists.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        if self.has_default(extension) {
            return;
        }
        self.doc.root.push(
            XmlElement::new("Default")
                .with_attr("Extension", extension.to_ascii_lowercase())
                .with_attr("ContentType", content_type),
        );
    }

    /// Add or replace an `Override` entry for a part.
    pub fn set_override(&mut self, part_name: &str, content_type: &str) {
        let part_name = format!("/{}", part_name.trim_start_matches('/'));
        for el in self.doc.root.elements_mut() {
            if el.local_name() == "Override" && el.attr("PartName") == Some(part_name.as_str()) {
                el.set_attr("ContentType", content_type);
                return;
            }
        }
        self.doc.root.push(
            XmlElement::new("Override")
                .with_attr("PartName", part_name)
                .with_attr("ContentType", content_type),
        );
    }

    /// Content type registered for a part, by override then by extension.
    pub fn content_type_of(&self, part_name: &str) -> Option<String> {
        let key = format!("/{}", part_name.trim_start_matches('/'));
        let by_override = self.doc.root.elements().find(|el| {
            el.local_name() == "Override" && el.attr("PartName") == Some(key.as_str())
        });
        if let Some(el) = by_override {
            return el.attr("ContentType").map(str::to_string);
        }
        let ext = part_name.rsplit_once('.').map(|(_, ext)| ext)?;
        self.doc
            .root
            .elements()
            .find(|el| {
                el.local_name() == "Default"
                    && el
                        .attr("Extension")
                        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            })
            .and_then(|el| el.attr("ContentType").map(str::to_string))
    }
}

/// Guess an image content type from a file extension.
pub(crate) fn image_content_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_and_default_lookup() {
        let package = Package::new();
        let mut types = ContentTypes::load(&package).unwrap();
        types.ensure_default("xml", "application/xml");
        types.set_override("word/footer1.xml", CT_FOOTER);

        assert_eq!(types.content_type_of("word/footer1.xml").as_deref(), Some(CT_FOOTER));
        assert_eq!(
            types.content_type_of("word/other.xml").as_deref(),
            Some("application/xml")
        );
        assert!(types.content_type_of("word/media/a.png").is_none());
    }

    #[test]
    fn test_ensure_default_is_idempotent() {
        let mut package = Package::new();
        let mut types = ContentTypes::load(&package).unwrap();
        types.ensure_default("PNG", "image/png");
        types.ensure_default("png", "image/png");
        types.store(&mut package).unwrap();

        let xml = String::from_utf8(package.get(CONTENT_TYPES_PART).unwrap().to_vec()).unwrap();
        assert_eq!(xml.matches("Extension=\"png\"").count(), 1);
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("JPG"), "image/jpeg");
        assert_eq!(image_content_type("png"), "image/png");
        assert_eq!(image_content_type("xyz"), "application/octet-stream");
    }
}

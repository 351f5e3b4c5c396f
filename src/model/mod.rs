//! Document model over WordprocessingML parts.
//!
//! [`Document`] owns the package and the parsed main part. Body content is
//! addressed by block index (position among body-level elements, excluding
//! the trailing `w:sectPr`). The free functions in [`paragraph`], [`table`]
//! and [`section`] operate on the raw [`XmlElement`] nodes.

mod document;
mod page;
pub mod paragraph;
pub mod section;
pub mod table;
mod xml;

pub use document::{namespace_attrs, Document, NS_O, NS_R, NS_V, NS_W, NS_W10};
pub use page::{map_pages_to_paragraphs, BlockKind, BlockSnapshot, PageMap};
pub use paragraph::{paragraph_text, Alignment};
pub use section::{HeaderFooterKind, PartKind};
pub use xml::{local_name, XmlDocument, XmlElement, XmlNode};

//! # journal-updater
//!
//! Produces the next issue of a templated journal from last issue's DOCX.
//!
//! The library rewrites the front cover, page-2 header and editorial blocks,
//! removes the previous issue's articles, appends the new articles and then
//! applies optional formatting driven by an `instructions.json` overlay.
//!
//! ## Quick Start
//!
//! ```no_run
//! use journal_updater::{update_journal, UpdateOptions};
//! use std::path::Path;
//!
//! fn main() -> journal_updater::Result<()> {
//!     let options = UpdateOptions::new()
//!         .with_issue("5", "2")
//!         .with_month_year("June 2025");
//!
//!     let report = update_journal(
//!         Path::new("last_issue.docx"),
//!         Path::new("content"),
//!         Path::new("new_issue.docx"),
//!         &options,
//!     )?;
//!     println!("Appended {} articles", report.articles_appended.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Page mapping**: manual page breaks split the body into pages
//! - **Article replacement**: by table of contents, editorial markers or page
//! - **Fixed-region patching**: cover, header, editors, business information
//! - **Formatting overlay**: fonts, spacing, columns, page borders, footer
//! - **Finishing passes**: named post-assembly passes from `instructions.json`
//! - **PDF export**: best-effort conversion through LibreOffice

pub mod detect;
pub mod error;
pub mod export;
pub mod journal;
pub mod model;
pub mod package;

// Re-export commonly used types
pub use detect::{detect_container_from_bytes, detect_container_from_path, is_docx, ContainerKind};
pub use error::{Error, Result};
pub use export::{ExportOutcome, PdfExporter, SofficeExporter};
pub use journal::{
    clear_articles, clear_articles_preserve_editorials, find_toc_titles, update_journal,
    update_journal_with, validate_issue_number_and_volume, Instructions, IssueInfo, PassRegistry,
    Removal, RemovalStrategy, UpdateOptions, UpdateReport,
};
pub use model::{map_pages_to_paragraphs, BlockKind, BlockSnapshot, Document, PageMap};
pub use package::Package;

use std::path::Path;

/// Open a DOCX file.
///
/// # Example
///
/// ```no_run
/// use journal_updater::load_document;
///
/// let doc = load_document("issue.docx").unwrap();
/// println!("Blocks: {}", doc.block_count());
/// ```
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    Document::open(path)
}

/// Save a document, writing back every modified part.
pub fn save_document<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
    doc.save(path)
}

/// Load a DOCX from bytes.
pub fn load_document_bytes(data: &[u8]) -> Result<Document> {
    Document::from_bytes(data)
}

//! Error types for journal-updater.

use std::io;
use thiserror::Error;

/// Result type alias for journal-updater operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, patching or saving a journal.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a DOCX (zip) container.
    #[error("Unknown file format: not a DOCX package")]
    NotDocx,

    /// Error reading or writing the zip container.
    #[error("Zip container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Error parsing or serializing an XML part.
    #[error("XML error: {0}")]
    Xml(String),

    /// A required package part is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The document body could not be located in the main part.
    #[error("Document has no body element")]
    MissingBody,

    /// Section index is out of range.
    #[error("Section {0} is out of range (document has {1} sections)")]
    SectionOutOfRange(usize, usize),

    /// Instructions overlay could not be encoded or decoded.
    #[error("Instructions error: {0}")]
    Instructions(#[from] serde_json::Error),

    /// Post-condition check on volume/issue/year text failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A finishing pass was given unusable parameters.
    #[error("Finishing pass '{0}': {1}")]
    Pass(String, String),

    /// External PDF conversion failed.
    #[error("PDF export failed: {0}")]
    Export(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

//! DOCX container detection.
//!
//! A DOCX file is an OPC package: a zip archive whose first local file
//! header starts with `PK\x03\x04` and which carries a `[Content_Types].xml`
//! part. The magic check here is cheap; the content-types check happens
//! when the package is opened.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Zip local file header signature.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Zip end-of-central-directory signature (empty archive).
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

/// Kind of zip container found at the start of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Archive with at least one entry
    Zip,
    /// Archive with no entries (never a valid DOCX)
    EmptyZip,
}

/// Detect the container kind from a file path.
///
/// # Example
/// ```no_run
/// use journal_updater::detect::detect_container_from_path;
///
/// let kind = detect_container_from_path("journal.docx").unwrap();
/// println!("{:?}", kind);
/// ```
pub fn detect_container_from_path<P: AsRef<Path>>(path: P) -> Result<ContainerKind> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 4];
    reader
        .read_exact(&mut header)
        .map_err(|_| Error::NotDocx)?;
    detect_container_from_bytes(&header)
}

/// Detect the container kind from the first bytes of a file.
pub fn detect_container_from_bytes(data: &[u8]) -> Result<ContainerKind> {
    if data.starts_with(ZIP_MAGIC) {
        Ok(ContainerKind::Zip)
    } else if data.starts_with(ZIP_EMPTY_MAGIC) {
        Ok(ContainerKind::EmptyZip)
    } else {
        Err(Error::NotDocx)
    }
}

/// Check if a file looks like a non-empty zip container.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_container_from_path(path), Ok(ContainerKind::Zip))
}

/// Check if bytes look like a non-empty zip container.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    matches!(detect_container_from_bytes(data), Ok(ContainerKind::Zip))
}

/// Check whether a file name has the `.docx` extension (any case).
pub fn has_docx_extension(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".docx")
}

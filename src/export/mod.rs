//! PDF export of the finished issue.
//!
//! Export is best effort: a missing converter or a failed conversion never
//! fails the update run.

mod soffice;

pub use soffice::{SofficeExporter, SOFFICE_ENV};

use crate::error::Result;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Converts a saved DOCX into PDF.
pub trait PdfExporter: Send + Sync {
    /// Get the name of this exporter.
    fn name(&self) -> &str;

    /// Convert `docx` into `pdf`.
    fn export(&self, docx: &Path, pdf: &Path) -> Result<()>;
}

/// Result of a best-effort export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum ExportOutcome {
    /// PDF written to this path
    Exported(PathBuf),
    /// Export not requested
    Skipped,
    /// Conversion failed with this message
    Failed(String),
}

impl ExportOutcome {
    /// Check if a PDF was written.
    pub fn is_exported(&self) -> bool {
        matches!(self, ExportOutcome::Exported(_))
    }
}

/// Sibling `.pdf` path for a document.
pub fn pdf_path_for(docx: &Path) -> PathBuf {
    docx.with_extension("pdf")
}

/// Export `docx` next to itself, logging instead of failing.
///
/// Failures mentioning a corrupted document are common with converter
/// round trips and are logged at debug level.
pub fn export_pdf_best_effort(exporter: &dyn PdfExporter, docx: &Path) -> ExportOutcome {
    let pdf = pdf_path_for(docx);
    match exporter.export(docx, &pdf) {
        Ok(()) => {
            info!("Exported {} with {}", pdf.display(), exporter.name());
            ExportOutcome::Exported(pdf)
        }
        Err(e) => {
            let message = e.to_string();
            if message.to_lowercase().contains("corrupted") {
                debug!("PDF export skipped: {}", message);
            } else {
                warn!("PDF export failed: {}", message);
            }
            ExportOutcome::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct FakeExporter {
        fail_with: Option<&'static str>,
    }

    impl PdfExporter for FakeExporter {
        fn name(&self) -> &str {
            "fake"
        }

        fn export(&self, _docx: &Path, pdf: &Path) -> Result<()> {
            match self.fail_with {
                Some(message) => Err(Error::Export(message.to_string())),
                None => {
                    std::fs::write(pdf, b"%PDF-1.4")?;
                    Ok(())
                }
            }
        }
    }

    #[test]
    fn test_pdf_path_for() {
        assert_eq!(pdf_path_for(Path::new("out/issue.docx")), PathBuf::from("out/issue.pdf"));
    }

    #[test]
    fn test_best_effort_success() {
        let dir = tempfile::TempDir::new().unwrap();
        let docx = dir.path().join("issue.docx");
        let outcome = export_pdf_best_effort(&FakeExporter { fail_with: None }, &docx);
        assert_eq!(outcome, ExportOutcome::Exported(dir.path().join("issue.pdf")));
        assert!(dir.path().join("issue.pdf").exists());
    }

    #[test]
    fn test_best_effort_failure_is_captured() {
        let exporter = FakeExporter {
            fail_with: Some("document appears corrupted"),
        };
        let outcome = export_pdf_best_effort(&exporter, Path::new("missing.docx"));
        match outcome {
            ExportOutcome::Failed(message) => assert!(message.contains("corrupted")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

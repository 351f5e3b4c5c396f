//! LibreOffice-based exporter.

use super::PdfExporter;
use crate::error::{Error, Result};
use log::debug;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Environment variable overriding the `soffice` binary.
pub const SOFFICE_ENV: &str = "JOURNAL_UPDATER_SOFFICE";

/// Runs `soffice --headless --convert-to pdf`.
#[derive(Debug, Clone)]
pub struct SofficeExporter {
    binary: OsString,
}

impl SofficeExporter {
    /// Use `$JOURNAL_UPDATER_SOFFICE`, or `soffice` from `PATH`.
    pub fn new() -> Self {
        let binary = std::env::var_os(SOFFICE_ENV).unwrap_or_else(|| OsString::from("soffice"));
        Self { binary }
    }

    /// Use a specific binary.
    pub fn with_binary(mut self, binary: impl Into<OsString>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Configured binary.
    pub fn binary(&self) -> &OsString {
        &self.binary
    }
}

impl Default for SofficeExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExporter for SofficeExporter {
    fn name(&self) -> &str {
        "soffice"
    }

    fn export(&self, docx: &Path, pdf: &Path) -> Result<()> {
        let outdir = match pdf.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        debug!("Running {:?} on {}", self.binary, docx.display());

        let output = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&outdir)
            .arg(docx)
            .output()
            .map_err(|e| Error::Export(format!("failed to run {:?}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Export(format!(
                "{:?} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let stem = docx
            .file_stem()
            .ok_or_else(|| Error::Export(format!("no file name in {}", docx.display())))?;
        let produced = outdir.join(format!("{}.pdf", stem.to_string_lossy()));
        if !produced.exists() {
            return Err(Error::Export(format!("no PDF produced for {}", docx.display())));
        }
        if produced != pdf {
            std::fs::rename(&produced, pdf)?;
        }
        Ok(())
    }
}

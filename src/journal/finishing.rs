//! Named finishing passes run after the issue is assembled.
//!
//! Passes are looked up by name in a [`PassRegistry`] and invoked with an
//! optional page and a JSON parameter map taken from `instructions.json`.
//!
//! # Example
//!
//! ```
//! use journal_updater::journal::{PassInstruction, PassRegistry};
//! use journal_updater::model::Document;
//!
//! let mut doc = Document::new();
//! doc.add_paragraph("Two  spaces");
//!
//! let registry = PassRegistry::with_defaults();
//! let pass = PassInstruction::new("remove_extra_spaces").with_page(1);
//! let ran = registry.run_all(&mut doc, &[pass]);
//! assert_eq!(ran, 1);
//! ```

use super::articles::delete_after_page;
use super::format::{autofit_first_table, cleanup_horizontal_lines};
use super::instructions::PassInstruction;
use super::patch::{detect_and_remove_extra_spaces, fix_apostrophe, remove_text_labels};
use crate::error::{Error, Result};
use crate::model::Document;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Parameters passed to a finishing pass.
pub type PassParams = Map<String, Value>;

/// A post-assembly document transformation.
///
/// Implement this trait to add a pass that can be named in `instructions.json`.
pub trait FinishingPass: Send + Sync {
    /// Registered name (lowercase, snake_case).
    fn name(&self) -> &str;

    /// Run the pass.
    fn apply(&self, doc: &mut Document, page: Option<u32>, params: &PassParams) -> Result<()>;
}

fn require_page(pass: &str, page: Option<u32>) -> Result<u32> {
    page.ok_or_else(|| Error::Pass(pass.to_string(), "a page is required".into()))
}

fn str_param<'a>(pass: &str, params: &'a PassParams, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Pass(pass.to_string(), format!("missing string parameter '{}'", key)))
}

fn string_list(params: &PassParams, key: &str) -> Vec<String> {
    match params.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn page_list(params: &PassParams, page: Option<u32>) -> Vec<u32> {
    let mut pages: Vec<u32> = match params.get("pages") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|p| u32::try_from(p).ok())
            .collect(),
        _ => Vec::new(),
    };
    if let Some(page) = page {
        if !pages.contains(&page) {
            pages.push(page);
        }
    }
    pages
}

/// Collapse a repeated-space pattern on some pages.
///
/// Params: `pages` (array), `pattern` (default two spaces).
#[derive(Debug, Default)]
pub struct RemoveExtraSpaces;

impl FinishingPass for RemoveExtraSpaces {
    fn name(&self) -> &str {
        "remove_extra_spaces"
    }

    fn apply(&self, doc: &mut Document, page: Option<u32>, params: &PassParams) -> Result<()> {
        let pages = page_list(params, page);
        if pages.is_empty() {
            return Err(Error::Pass(self.name().into(), "no pages given".into()));
        }
        let pattern = params.get("pattern").and_then(Value::as_str).unwrap_or("  ");
        let changed = detect_and_remove_extra_spaces(doc, &pages, pattern);
        debug!("Collapsed spaces in {} paragraphs", changed);
        Ok(())
    }
}

/// Replace a misspelt word on one page.
///
/// Params: `word`, `corrected`.
#[derive(Debug, Default)]
pub struct FixApostrophe;

impl FinishingPass for FixApostrophe {
    fn name(&self) -> &str {
        "fix_apostrophe"
    }

    fn apply(&self, doc: &mut Document, page: Option<u32>, params: &PassParams) -> Result<()> {
        let page = require_page(self.name(), page)?;
        let word = str_param(self.name(), params, "word")?;
        let corrected = str_param(self.name(), params, "corrected")?;
        let changed = fix_apostrophe(doc, page, word, corrected);
        debug!("Corrected '{}' in {} paragraphs on page {}", word, changed, page);
        Ok(())
    }
}

/// Remove literal labels everywhere.
///
/// Params: `labels` (array or string).
#[derive(Debug, Default)]
pub struct RemoveTextLabels;

impl FinishingPass for RemoveTextLabels {
    fn name(&self) -> &str {
        "remove_text_labels"
    }

    fn apply(&self, doc: &mut Document, _page: Option<u32>, params: &PassParams) -> Result<()> {
        let labels = string_list(params, "labels");
        remove_text_labels(doc, &labels);
        Ok(())
    }
}

/// Autofit the first table on a page.
#[derive(Debug, Default)]
pub struct AutofitTable;

impl FinishingPass for AutofitTable {
    fn name(&self) -> &str {
        "autofit_table"
    }

    fn apply(&self, doc: &mut Document, page: Option<u32>, _params: &PassParams) -> Result<()> {
        let page = require_page(self.name(), page)?;
        autofit_first_table(doc, page);
        Ok(())
    }
}

/// Remove consecutive duplicate horizontal lines.
#[derive(Debug, Default)]
pub struct CleanupHorizontalLines;

impl FinishingPass for CleanupHorizontalLines {
    fn name(&self) -> &str {
        "cleanup_horizontal_lines"
    }

    fn apply(&self, doc: &mut Document, _page: Option<u32>, _params: &PassParams) -> Result<()> {
        cleanup_horizontal_lines(doc);
        Ok(())
    }
}

/// Keep pages up to and including the given one.
#[derive(Debug, Default)]
pub struct DeleteAfterPage;

impl FinishingPass for DeleteAfterPage {
    fn name(&self) -> &str {
        "delete_after_page"
    }

    fn apply(&self, doc: &mut Document, page: Option<u32>, _params: &PassParams) -> Result<()> {
        let page = require_page(self.name(), page)?;
        let removed = delete_after_page(doc, page);
        debug!("Deleted {} blocks after page {}", removed, page);
        Ok(())
    }
}

/// Registry of finishing passes by name.
pub struct PassRegistry {
    passes: HashMap<String, Arc<dyn FinishingPass>>,
}

impl PassRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            passes: HashMap::new(),
        }
    }

    /// Create a registry with the built-in passes.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RemoveExtraSpaces));
        registry.register(Arc::new(FixApostrophe));
        registry.register(Arc::new(RemoveTextLabels));
        registry.register(Arc::new(AutofitTable));
        registry.register(Arc::new(CleanupHorizontalLines));
        registry.register(Arc::new(DeleteAfterPage));
        registry
    }

    /// Register a pass, replacing any pass with the same name.
    pub fn register(&mut self, pass: Arc<dyn FinishingPass>) {
        self.passes.insert(pass.name().to_lowercase(), pass);
    }

    /// Get a pass by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<Arc<dyn FinishingPass>> {
        self.passes.get(&name.to_lowercase()).cloned()
    }

    /// Registered pass names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.passes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Run one pass.
    pub fn run(&self, doc: &mut Document, instruction: &PassInstruction) -> Result<()> {
        let pass = self
            .get(&instruction.pass)
            .ok_or_else(|| Error::Other(format!("Unknown finishing pass: {}", instruction.pass)))?;
        pass.apply(doc, instruction.page, &instruction.params)
    }

    /// Run passes in order. Unknown or failing passes are logged and skipped.
    ///
    /// Returns the number of passes that ran successfully.
    pub fn run_all(&self, doc: &mut Document, instructions: &[PassInstruction]) -> usize {
        let mut ran = 0;
        for instruction in instructions {
            if self.get(&instruction.pass).is_none() {
                warn!("Skipping unknown finishing pass '{}'", instruction.pass);
                continue;
            }
            match self.run(doc, instruction) {
                Ok(()) => {
                    info!("Finishing pass '{}' applied", instruction.pass);
                    ran += 1;
                }
                Err(e) => warn!("{}", e),
            }
        }
        ran
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

//! Fixed-region text patchers.
//!
//! Each patcher is split into a planner, which reads a [`BlockSnapshot`]
//! list and returns a [`PatchPlan`], and [`PatchPlan::apply`], which edits
//! the document in one pass. Planners act on the first matching landmark
//! only and return an empty plan when it is absent.

use super::text::normalize;
use crate::error::Result;
use crate::model::paragraph::{
    collapse_in_runs, paragraph_text, replace_in_runs, set_alignment, set_bold, set_bottom_border,
    set_paragraph_text, P,
};
use crate::model::{Alignment, BlockSnapshot, Document, HeaderFooterKind, PageMap, PartKind, XmlElement};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder written when no president's message is supplied.
pub const PRESIDENT_PLACEHOLDER: &str = "<<Awaiting President's message>>";

/// Substring locating the front-cover volume/issue block.
pub const COVER_LANDMARK: &str = "Volume";

/// Volume, issue and date of the issue being produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInfo {
    /// Volume number
    pub volume: String,

    /// Issue number
    pub issue: String,

    /// Issue date line (e.g. "June 2025")
    pub month_year: String,

    /// Optional section title printed under the date
    pub section_title: Option<String>,
}

impl IssueInfo {
    /// Create issue info without a section title.
    pub fn new(
        volume: impl Into<String>,
        issue: impl Into<String>,
        month_year: impl Into<String>,
    ) -> Self {
        Self {
            volume: volume.into(),
            issue: issue.into(),
            month_year: month_year.into(),
            section_title: None,
        }
    }

    /// Set the section title.
    pub fn with_section_title(mut self, title: impl Into<String>) -> Self {
        self.section_title = Some(title.into());
        self
    }

    /// `"Volume {V}, Issue {I}"`.
    pub fn label(&self) -> String {
        format!("Volume {}, Issue {}", self.volume, self.issue)
    }

    /// The year part of the date line (last whitespace-separated token).
    pub fn year(&self) -> Option<&str> {
        self.month_year.split_whitespace().last()
    }

    /// Front-cover block text for the given page number.
    pub fn cover_text(&self, page: u32) -> String {
        let mut lines = vec![self.label(), self.month_year.clone()];
        if let Some(title) = self.section_title.as_deref().filter(|t| !t.trim().is_empty()) {
            lines.push(title.to_string());
        }
        lines.push(format!("Page {}", page));
        lines.join("\n")
    }
}

/// Edits to one paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphEdit {
    /// Run-level `(search, replace)` pairs, applied first
    pub replacements: Vec<(String, String)>,

    /// Pattern collapsed to a single space inside runs
    pub collapse: Option<String>,

    /// New paragraph text
    pub text: Option<String>,

    /// Bold on/off for every run
    pub bold: Option<bool>,

    /// Paragraph alignment
    pub alignment: Option<Alignment>,

    /// Add a bottom border
    pub bottom_border: bool,

    /// Remove the paragraph (overrides everything else)
    pub remove: bool,
}

impl ParagraphEdit {
    /// Apply the edit to a paragraph element.
    pub fn apply_to(&self, p: &mut XmlElement) {
        for (search, replace) in &self.replacements {
            replace_in_runs(p, search, replace);
        }
        if let Some(pattern) = &self.collapse {
            collapse_in_runs(p, pattern);
        }
        if let Some(text) = &self.text {
            set_paragraph_text(p, text);
        }
        if let Some(bold) = self.bold {
            set_bold(p, bold);
        }
        if let Some(alignment) = self.alignment {
            set_alignment(p, alignment);
        }
        if self.bottom_border {
            set_bottom_border(p);
        }
    }
}

/// Planned edits keyed by block index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchPlan {
    edits: BTreeMap<usize, ParagraphEdit>,
}

impl PatchPlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit for a block, created on first use.
    pub fn edit(&mut self, index: usize) -> &mut ParagraphEdit {
        self.edits.entry(index).or_default()
    }

    /// Planned edit for a block.
    pub fn get(&self, index: usize) -> Option<&ParagraphEdit> {
        self.edits.get(&index)
    }

    /// Check if nothing is planned.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Number of edited blocks.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Fold another plan into this one; later edits win field by field.
    pub fn merge(&mut self, other: PatchPlan) {
        for (index, edit) in other.edits {
            let slot = self.edit(index);
            slot.replacements.extend(edit.replacements);
            if edit.collapse.is_some() {
                slot.collapse = edit.collapse;
            }
            if edit.text.is_some() {
                slot.text = edit.text;
            }
            if edit.bold.is_some() {
                slot.bold = edit.bold;
            }
            if edit.alignment.is_some() {
                slot.alignment = edit.alignment;
            }
            slot.bottom_border |= edit.bottom_border;
            slot.remove |= edit.remove;
        }
    }

    /// Apply to the document body; removals run last, highest index first.
    ///
    /// Returns the number of blocks touched.
    pub fn apply(&self, doc: &mut Document) -> usize {
        let mut touched = 0;
        let mut removals = Vec::new();
        for (&index, edit) in &self.edits {
            if edit.remove {
                removals.push(index);
                continue;
            }
            if let Some(block) = doc.block_mut(index) {
                edit.apply_to(block);
                touched += 1;
            }
        }
        for index in removals.into_iter().rev() {
            if doc.remove_block(index).is_some() {
                touched += 1;
            }
        }
        touched
    }
}

fn first_paragraph<'a, F>(snapshot: &'a [BlockSnapshot], pred: F) -> Option<&'a BlockSnapshot>
where
    F: Fn(&str) -> bool,
{
    snapshot
        .iter()
        .find(|b| b.is_paragraph() && pred(&normalize_lines(&b.text)))
}

/// Normalize each line but keep line breaks.
fn normalize_lines(text: &str) -> String {
    text.split('\n').map(normalize).collect::<Vec<_>>().join("\n")
}

/// Plan the front-cover rewrite.
pub fn plan_front_cover(
    snapshot: &[BlockSnapshot],
    issue: &IssueInfo,
    page: u32,
    formatted: bool,
) -> PatchPlan {
    let mut plan = PatchPlan::new();
    if let Some(block) = first_paragraph(snapshot, |t| t.contains(COVER_LANDMARK)) {
        let edit = plan.edit(block.index);
        edit.text = Some(issue.cover_text(page));
        edit.bold = Some(true);
        if formatted {
            edit.alignment = Some(Alignment::Center);
            edit.bottom_border = true;
        }
    }
    plan
}

/// Plan the business-information update.
pub fn plan_business_information(
    snapshot: &[BlockSnapshot],
    old_year: &str,
    new_beginning: &str,
) -> PatchPlan {
    let mut plan = PatchPlan::new();
    if !old_year.is_empty() {
        for block in snapshot
            .iter()
            .filter(|b| b.is_paragraph() && b.text.contains(old_year))
        {
            plan.edit(block.index)
                .replacements
                .push((old_year.to_string(), String::new()));
        }
    }

    if let Some(block) = first_paragraph(snapshot, |t| t.contains("Annual subscription")) {
        let current = if old_year.is_empty() {
            block.text.clone()
        } else {
            block.text.replace(old_year, "")
        };
        let first_part = current.split('.').next().unwrap_or_default();
        let updated = if first_part.is_empty() {
            format!("{}{}", new_beginning, current)
        } else {
            current.replacen(first_part, new_beginning, 1)
        };
        plan.edit(block.index).text = Some(updated);
    }
    plan
}

/// Plan writing the president's message into the paragraph after its heading.
pub fn plan_presidents_message(snapshot: &[BlockSnapshot], message: Option<&str>) -> PatchPlan {
    let mut plan = PatchPlan::new();
    let text = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(PRESIDENT_PLACEHOLDER);

    let heading = snapshot
        .iter()
        .position(|b| b.is_paragraph() && normalize(&b.text).contains("President's Message"));
    let target = heading.and_then(|pos| snapshot[pos + 1..].iter().find(|b| b.is_paragraph()));
    match target {
        Some(block) => plan.edit(block.index).text = Some(text.to_string()),
        None => debug!("No president's message landmark"),
    }
    plan
}

/// Plan replacing an associate editor entry.
pub fn plan_associate_editors(
    snapshot: &[BlockSnapshot],
    remove_name: &str,
    name: &str,
    affiliation: &str,
    email: &str,
) -> PatchPlan {
    let mut plan = PatchPlan::new();
    if remove_name.is_empty() {
        return plan;
    }
    if let Some(block) = first_paragraph(snapshot, |t| t.contains(remove_name)) {
        plan.edit(block.index).text = Some(format!("{}, {}\n{}", name, affiliation, email));
    }
    plan
}

/// Plan removing an assistant editor entry.
pub fn plan_assistant_editors(snapshot: &[BlockSnapshot], remove_name: &str) -> PatchPlan {
    let mut plan = PatchPlan::new();
    if remove_name.is_empty() {
        return plan;
    }
    if let Some(block) = first_paragraph(snapshot, |t| t.contains(remove_name)) {
        plan.edit(block.index).remove = true;
    }
    plan
}

/// Plan run-level replacements in paragraphs, optionally limited to some blocks.
pub fn plan_replacements(
    snapshot: &[BlockSnapshot],
    within: Option<&[usize]>,
    search: &str,
    replace: &str,
) -> PatchPlan {
    let mut plan = PatchPlan::new();
    if search.is_empty() {
        return plan;
    }
    for block in snapshot.iter().filter(|b| b.is_paragraph()) {
        if within.is_some_and(|allowed| !allowed.contains(&block.index)) {
            continue;
        }
        if block.text.contains(search) {
            plan.edit(block.index)
                .replacements
                .push((search.to_string(), replace.to_string()));
        }
    }
    plan
}

/// Plan collapsing `pattern` on the given pages.
pub fn plan_extra_spaces(
    snapshot: &[BlockSnapshot],
    pages: &PageMap,
    page_list: &[u32],
    pattern: &str,
) -> PatchPlan {
    let mut plan = PatchPlan::new();
    if pattern.is_empty() || pattern == " " {
        return plan;
    }
    for &page in page_list {
        for &index in pages.paragraphs_on(page) {
            if snapshot[index].text.contains(pattern) {
                plan.edit(index).collapse = Some(pattern.to_string());
            }
        }
    }
    plan
}

/// Rewrite the front-cover volume/issue block. Returns whether it was found.
pub fn update_front_cover(doc: &mut Document, issue: &IssueInfo, page: u32, formatted: bool) -> bool {
    let plan = plan_front_cover(&doc.snapshot(), issue, page, formatted);
    plan.apply(doc) > 0
}

/// Drop a stale year and rewrite the subscription sentence.
pub fn update_business_information(doc: &mut Document, old_year: &str, new_beginning: &str) -> bool {
    let plan = plan_business_information(&doc.snapshot(), old_year, new_beginning);
    plan.apply(doc) > 0
}

/// Write the president's message (or the placeholder).
pub fn insert_presidents_message(doc: &mut Document, message: Option<&str>) -> bool {
    let plan = plan_presidents_message(&doc.snapshot(), message);
    plan.apply(doc) > 0
}

/// Replace the first paragraph mentioning `remove_name` with a new editor entry.
pub fn update_associate_editors(
    doc: &mut Document,
    remove_name: &str,
    name: &str,
    affiliation: &str,
    email: &str,
) -> bool {
    let plan = plan_associate_editors(&doc.snapshot(), remove_name, name, affiliation, email);
    plan.apply(doc) > 0
}

/// Remove the first paragraph mentioning `remove_name`.
pub fn update_assistant_editors(doc: &mut Document, remove_name: &str) -> bool {
    let plan = plan_assistant_editors(&doc.snapshot(), remove_name);
    plan.apply(doc) > 0
}

/// Remove each label wherever it appears in a run.
pub fn remove_text_labels<S: AsRef<str>>(doc: &mut Document, labels: &[S]) -> usize {
    let snapshot = doc.snapshot();
    let mut plan = PatchPlan::new();
    for label in labels {
        plan.merge(plan_replacements(&snapshot, None, label.as_ref(), ""));
    }
    plan.apply(doc)
}

/// Replace a word on one page with its corrected spelling.
pub fn fix_apostrophe(doc: &mut Document, page: u32, word: &str, corrected: &str) -> usize {
    let snapshot = doc.snapshot();
    let pages = PageMap::from_blocks(&snapshot);
    let plan = plan_replacements(&snapshot, Some(pages.paragraphs_on(page)), word, corrected);
    plan.apply(doc)
}

/// Collapse repeated spaces on the given pages.
pub fn detect_and_remove_extra_spaces(doc: &mut Document, page_list: &[u32], pattern: &str) -> usize {
    let snapshot = doc.snapshot();
    let pages = PageMap::from_blocks(&snapshot);
    let plan = plan_extra_spaces(&snapshot, &pages, page_list, pattern);
    plan.apply(doc)
}

/// Put `"{header_text}\nPage {page}"` into the first non-blank paragraph of every default header.
///
/// Returns the number of header parts changed.
pub fn update_page2_header(doc: &mut Document, header_text: &str, page: u32) -> Result<usize> {
    let mut parts = Vec::new();
    for section in 0..doc.section_count() {
        if let Some(name) =
            doc.header_footer_part(section, PartKind::Header, HeaderFooterKind::Default)?
        {
            if !parts.contains(&name) {
                parts.push(name);
            }
        }
    }

    let text = format!("{}\nPage {}", header_text, page);
    let mut changed = 0;
    for name in parts {
        let Some(part) = doc.part_mut(&name)? else {
            continue;
        };
        let target = part
            .root
            .elements_mut()
            .filter(|el| el.name == P)
            .find(|p| !paragraph_text(p).trim().is_empty());
        if let Some(p) = target {
            set_paragraph_text(p, &text);
            changed += 1;
        }
    }
    if changed == 0 {
        debug!("No header paragraph to update");
    }
    Ok(changed)
}

//! Options and report types for a journal update run.

use super::articles::{default_editorial_headings, Removal};
use super::format::DEFAULT_FOOTER_LABEL;
use super::patch::IssueInfo;
use crate::export::ExportOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Section title printed under the cover date when none is given.
pub const DEFAULT_SECTION_TITLE: &str = "Update Articles";

/// Issue date line for today, e.g. "June 2025".
pub fn current_month_year() -> String {
    chrono::Local::now().format("%B %Y").to_string()
}

/// Business-information rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    /// Stale year to strip
    pub old_year: String,

    /// Replacement for the first sentence of the subscription paragraph
    pub new_beginning: String,
}

/// Associate editor swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateEditor {
    /// Name identifying the entry to replace
    pub remove_name: String,

    /// New editor name
    pub name: String,

    /// New editor affiliation
    pub affiliation: String,

    /// New editor e-mail
    pub email: String,
}

/// Options for [`update_journal`](super::update_journal).
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Volume, issue, date line and section title
    pub issue: IssueInfo,

    /// Page number printed on the front cover
    pub cover_page_num: u32,

    /// Page number printed in the page-2 header
    pub header_page_num: u32,

    /// Header text (defaults to label, date and section title)
    pub header_text: Option<String>,

    /// Remove old articles from this page instead of by landmark
    pub start_page: Option<u32>,

    /// Articles to append (discovered in the content directory when `None`)
    pub article_files: Option<Vec<PathBuf>>,

    /// Business-information rewrite
    pub business: Option<BusinessInfo>,

    /// Associate editor swap
    pub associate_editor: Option<AssociateEditor>,

    /// Assistant editors to remove
    pub assistant_editor_removals: Vec<String>,

    /// Literal labels to strip from the body
    pub text_labels: Vec<String>,

    /// Headings that mark editorial content to keep
    pub editorial_headings: Vec<String>,

    /// Center the cover block and install the footer table
    pub format_front_and_footer: bool,

    /// Left-hand footer text
    pub footer_label: String,

    /// Export a sibling PDF after saving
    pub export_pdf: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            issue: IssueInfo::new("1", "1", current_month_year())
                .with_section_title(DEFAULT_SECTION_TITLE),
            cover_page_num: 1,
            header_page_num: 2,
            header_text: None,
            start_page: None,
            article_files: None,
            business: None,
            associate_editor: None,
            assistant_editor_removals: Vec::new(),
            text_labels: Vec::new(),
            editorial_headings: default_editorial_headings(),
            format_front_and_footer: true,
            footer_label: DEFAULT_FOOTER_LABEL.to_string(),
            export_pdf: true,
        }
    }
}

impl UpdateOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set volume and issue numbers.
    pub fn with_issue(mut self, volume: impl Into<String>, issue: impl Into<String>) -> Self {
        self.issue.volume = volume.into();
        self.issue.issue = issue.into();
        self
    }

    /// Set the date line.
    pub fn with_month_year(mut self, month_year: impl Into<String>) -> Self {
        self.issue.month_year = month_year.into();
        self
    }

    /// Set the section title; an empty title removes it.
    pub fn with_section_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.issue.section_title = if title.trim().is_empty() {
            None
        } else {
            Some(title)
        };
        self
    }

    /// Set cover and header page numbers.
    pub fn with_page_numbers(mut self, cover: u32, header: u32) -> Self {
        self.cover_page_num = cover;
        self.header_page_num = header;
        self
    }

    /// Set explicit header text.
    pub fn with_header_text(mut self, text: impl Into<String>) -> Self {
        self.header_text = Some(text.into());
        self
    }

    /// Remove old articles from a page.
    pub fn with_start_page(mut self, page: u32) -> Self {
        self.start_page = Some(page);
        self
    }

    /// Append these articles instead of discovering them.
    pub fn with_article_files(mut self, files: Vec<PathBuf>) -> Self {
        self.article_files = Some(files);
        self
    }

    /// Rewrite business information.
    pub fn with_business(mut self, old_year: impl Into<String>, new_beginning: impl Into<String>) -> Self {
        self.business = Some(BusinessInfo {
            old_year: old_year.into(),
            new_beginning: new_beginning.into(),
        });
        self
    }

    /// Swap an associate editor.
    pub fn with_associate_editor(mut self, editor: AssociateEditor) -> Self {
        self.associate_editor = Some(editor);
        self
    }

    /// Remove an assistant editor.
    pub fn remove_assistant_editor(mut self, name: impl Into<String>) -> Self {
        self.assistant_editor_removals.push(name.into());
        self
    }

    /// Strip a literal label.
    pub fn remove_label(mut self, label: impl Into<String>) -> Self {
        self.text_labels.push(label.into());
        self
    }

    /// Replace the editorial heading list.
    pub fn with_editorial_headings(mut self, headings: Vec<String>) -> Self {
        self.editorial_headings = headings;
        self
    }

    /// Enable or disable cover/footer layout.
    pub fn with_front_and_footer(mut self, enabled: bool) -> Self {
        self.format_front_and_footer = enabled;
        self
    }

    /// Set the left-hand footer text.
    pub fn with_footer_label(mut self, label: impl Into<String>) -> Self {
        self.footer_label = label.into();
        self
    }

    /// Enable or disable PDF export.
    pub fn with_pdf_export(mut self, enabled: bool) -> Self {
        self.export_pdf = enabled;
        self
    }

    /// Header text, defaulting to label, date and section title on separate lines.
    pub fn resolved_header_text(&self) -> String {
        if let Some(text) = &self.header_text {
            return text.clone();
        }
        let mut lines = vec![self.issue.label(), self.issue.month_year.clone()];
        if let Some(title) = &self.issue.section_title {
            lines.push(title.clone());
        }
        lines.join("\n")
    }
}

/// What an update run did.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    /// Saved document
    pub output: PathBuf,

    /// Volume actually used
    pub volume: String,

    /// Issue actually used
    pub issue: String,

    /// How old articles were removed
    pub removal: Removal,

    /// Block index where new articles start
    pub insertion_index: usize,

    /// Articles appended, in order
    pub articles_appended: Vec<PathBuf>,

    /// Finishing passes that ran
    pub passes_run: usize,

    /// PDF export result
    pub export: ExportOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = UpdateOptions::default();
        assert_eq!(options.issue.section_title.as_deref(), Some("Update Articles"));
        assert_eq!(options.cover_page_num, 1);
        assert_eq!(options.header_page_num, 2);
        assert!(options.format_front_and_footer);
        assert!(options.export_pdf);
        assert!(!options.issue.month_year.is_empty());
    }

    #[test]
    fn test_builder() {
        let options = UpdateOptions::new()
            .with_issue("4", "6")
            .with_month_year("June 2025")
            .with_section_title("")
            .with_start_page(3)
            .remove_assistant_editor("Jane Roe")
            .with_pdf_export(false);

        assert_eq!(options.issue.label(), "Volume 4, Issue 6");
        assert!(options.issue.section_title.is_none());
        assert_eq!(options.start_page, Some(3));
        assert_eq!(options.assistant_editor_removals, vec!["Jane Roe".to_string()]);
        assert!(!options.export_pdf);
    }

    #[test]
    fn test_resolved_header_text() {
        let options = UpdateOptions::new()
            .with_issue("2", "3")
            .with_month_year("May 2026");
        assert_eq!(
            options.resolved_header_text(),
            "Volume 2, Issue 3\nMay 2026\nUpdate Articles"
        );
        let options = options.with_header_text("Custom");
        assert_eq!(options.resolved_header_text(), "Custom");
    }
}

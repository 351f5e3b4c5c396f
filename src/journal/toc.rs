//! Table-of-contents detection.

use super::text::{fold, is_all_caps, is_blank};
use crate::model::{BlockSnapshot, Document};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Title followed by a dot leader (or tab) and a page number.
fn leader_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*?)(?:\s*\.{2,}|\t)\s*\d+\s*$").expect("valid dot-leader pattern")
    })
}

/// Result of scanning a document for its table of contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocScan {
    /// Article titles in TOC order
    pub titles: Vec<String>,

    /// Block indices covered by the TOC (heading through last entry)
    pub span: Range<usize>,

    /// Block index of the TOC heading, if one was found
    pub heading: Option<usize>,
}

impl TocScan {
    /// Check whether a block lies inside the TOC.
    pub fn covers(&self, index: usize) -> bool {
        self.span.contains(&index)
    }
}

/// Check whether a paragraph introduces the table of contents.
pub fn is_toc_heading(text: &str) -> bool {
    let folded = fold(text);
    folded == "contents" || folded.contains("table of contents")
}

/// Strip a trailing dot leader and page number from a TOC line.
pub fn strip_leader(line: &str) -> String {
    let trimmed = line.trim();
    match leader_pattern().captures(trimmed) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        None => trimmed.to_string(),
    }
}

/// Scan a block snapshot for the TOC's ARTICLES entries.
///
/// The ARTICLES sub-heading must follow the TOC heading on the same page.
/// Entries run until the first blank or all-caps line.
pub fn scan_toc(snapshot: &[BlockSnapshot]) -> TocScan {
    let paragraphs: Vec<&BlockSnapshot> = snapshot.iter().filter(|b| b.is_paragraph()).collect();

    let Some(heading_pos) = paragraphs.iter().position(|b| is_toc_heading(&b.text)) else {
        return TocScan::default();
    };
    let heading = paragraphs[heading_pos].index;
    let empty = TocScan {
        heading: Some(heading),
        span: heading..heading + 1,
        ..TocScan::default()
    };

    let mut articles_pos = None;
    for (pos, block) in paragraphs.iter().enumerate().skip(heading_pos) {
        if pos > heading_pos && fold(&block.text) == "articles" {
            articles_pos = Some(pos);
            break;
        }
        if block.page_break {
            break;
        }
    }
    let Some(articles_pos) = articles_pos else {
        return empty;
    };

    let mut titles = Vec::new();
    let mut last = paragraphs[articles_pos].index;
    for block in paragraphs.iter().skip(articles_pos + 1) {
        if is_blank(&block.text) || is_all_caps(&block.text) {
            break;
        }
        titles.push(strip_leader(&block.text));
        last = block.index;
        if block.page_break {
            break;
        }
    }

    TocScan {
        titles,
        span: heading..last + 1,
        heading: Some(heading),
    }
}

/// Article titles listed under ARTICLES in the table of contents.
pub fn find_toc_titles(doc: &Document) -> Vec<String> {
    scan_toc(&doc.snapshot()).titles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(lines: &[&str]) -> Document {
        let mut doc = Document::new();
        for line in lines {
            doc.add_paragraph(line);
        }
        doc
    }

    #[test]
    fn test_strip_leader() {
        assert_eq!(strip_leader("First Article......1"), "First Article");
        assert_eq!(strip_leader("Second Article ..... 15 "), "Second Article");
        assert_eq!(strip_leader("Tabbed\t7"), "Tabbed");
        assert_eq!(strip_leader("No leader here"), "No leader here");
        assert_eq!(strip_leader("Ends with 2024"), "Ends with 2024");
    }

    #[test]
    fn test_titles_and_span() {
        let doc = doc_with(&[
            "Table of Contents",
            "ARTICLES",
            "First Article......1",
            "Second Article.....5",
            "",
            "OTHER",
            "ARTICLES",
            "First Article",
        ]);
        let scan = scan_toc(&doc.snapshot());
        assert_eq!(scan.titles, vec!["First Article", "Second Article"]);
        assert_eq!(scan.span, 0..4);
        assert!(scan.covers(3));
        assert!(!scan.covers(7));
    }

    #[test]
    fn test_stops_at_all_caps_line() {
        let doc = doc_with(&["Contents", "ARTICLES", "Only One....3", "BOOK REVIEWS", "Review....9"]);
        assert_eq!(find_toc_titles(&doc), vec!["Only One"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let doc = doc_with(&["Table of Contents", "ARTICLES", "Same....1", "Same....4"]);
        assert_eq!(find_toc_titles(&doc), vec!["Same", "Same"]);
    }

    #[test]
    fn test_missing_toc_or_subheading() {
        assert!(find_toc_titles(&doc_with(&["Intro", "ARTICLES", "Body"])).is_empty());

        let scan = scan_toc(&doc_with(&["Table of Contents", "Editorial....2"]).snapshot());
        assert!(scan.titles.is_empty());
        assert_eq!(scan.heading, Some(0));
    }

    #[test]
    fn test_subheading_must_share_the_heading_page() {
        let mut doc = Document::new();
        let heading = doc.add_paragraph("Table of Contents");
        doc.add_break_to(heading);
        doc.add_paragraph("ARTICLES");
        doc.add_paragraph("Body Title");
        assert!(find_toc_titles(&doc).is_empty());
    }
}

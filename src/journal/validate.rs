//! Post-update checks.

use crate::error::{Error, Result};
use crate::model::Document;

/// Count non-overlapping occurrences of `needle` across body paragraphs.
pub fn count_occurrences(doc: &Document, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    doc.paragraph_texts()
        .iter()
        .map(|text| text.matches(needle).count())
        .sum()
}

/// Check that `"Volume {V}, Issue {I}"` and the year each appear exactly once.
pub fn validate_issue_number_and_volume(
    doc: &Document,
    volume: &str,
    issue: &str,
    year: &str,
) -> Result<()> {
    let label = format!("Volume {}, Issue {}", volume, issue);
    let label_count = count_occurrences(doc, &label);
    if label_count != 1 {
        return Err(Error::Validation(format!(
            "expected \"{}\" once, found {} times",
            label, label_count
        )));
    }

    let year_count = count_occurrences(doc, year);
    if year_count != 1 {
        return Err(Error::Validation(format!(
            "expected year {} once, found {} times",
            year, year_count
        )));
    }
    Ok(())
}

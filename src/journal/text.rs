//! Text normalization used for landmark and title matching.

use unicode_normalization::UnicodeNormalization;

/// Normalize text for comparison.
///
/// Applies NFC, folds typographic quotes and non-breaking spaces to their
/// ASCII forms, trims, and collapses internal whitespace runs.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfc()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized, lowercased form for case-insensitive equality.
pub fn fold(text: &str) -> String {
    normalize(text).to_lowercase()
}

/// Case-insensitive equality after normalization.
pub fn eq_fold(a: &str, b: &str) -> bool {
    fold(a) == fold(b)
}

/// Check whether a line is blank.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Check whether a line is written entirely in capitals (and has letters).
pub fn is_all_caps(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| !c.is_lowercase())
}

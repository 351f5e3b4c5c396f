//! The optional `instructions.json` overlay.
//!
//! ```json
//! {
//!   "volume": 4,
//!   "issue": "6",
//!   "font_size": 11,
//!   "font_size_from_page": 5,
//!   "cleanup_black_lines": true,
//!   "page_borders": { "center_line": true },
//!   "finishing_passes": [
//!     { "pass": "fix_apostrophe", "page": 7, "params": { "word": "nurses voices", "corrected": "nurses' voices" } }
//!   ]
//! }
//! ```
//!
//! Unknown keys are ignored.

use crate::error::Result;
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// File name looked up in the content directory.
pub const INSTRUCTIONS_FILE: &str = "instructions.json";

/// Column layout request: a bare count or a detailed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnsInstruction {
    /// Number of columns
    Count(u32),
    /// Count with spacing (twips) and target section
    Detailed {
        /// Number of columns
        count: u32,
        /// Space between columns in twips
        #[serde(default)]
        spacing: Option<u32>,
        /// Section index
        #[serde(default)]
        section: Option<usize>,
    },
}

impl ColumnsInstruction {
    /// Default spacing between columns (half an inch).
    pub const DEFAULT_SPACING: u32 = 720;

    /// Number of columns.
    pub fn count(&self) -> u32 {
        match self {
            ColumnsInstruction::Count(count) => *count,
            ColumnsInstruction::Detailed { count, .. } => *count,
        }
    }

    /// Column spacing in twips.
    pub fn spacing(&self) -> u32 {
        match self {
            ColumnsInstruction::Detailed {
                spacing: Some(spacing),
                ..
            } => *spacing,
            _ => Self::DEFAULT_SPACING,
        }
    }

    /// Target section (defaults to the first).
    pub fn section(&self) -> usize {
        match self {
            ColumnsInstruction::Detailed {
                section: Some(section),
                ..
            } => *section,
            _ => 0,
        }
    }
}

/// Page border request: `true` or `{ "center_line": bool }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageBordersInstruction {
    /// Plain on/off
    Enabled(bool),
    /// Borders with an optional center rule
    Detailed {
        /// Draw a centered vertical rule
        #[serde(default)]
        center_line: bool,
        /// Section index
        #[serde(default)]
        section: Option<usize>,
    },
}

impl PageBordersInstruction {
    /// Whether borders should be applied.
    pub fn enabled(&self) -> bool {
        match self {
            PageBordersInstruction::Enabled(on) => *on,
            PageBordersInstruction::Detailed { .. } => true,
        }
    }

    /// Whether the center rule is requested.
    pub fn center_line(&self) -> bool {
        matches!(
            self,
            PageBordersInstruction::Detailed {
                center_line: true,
                ..
            }
        )
    }

    /// Target section (defaults to the first).
    pub fn section(&self) -> usize {
        match self {
            PageBordersInstruction::Detailed {
                section: Some(section),
                ..
            } => *section,
            _ => 0,
        }
    }
}

/// One finishing pass invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassInstruction {
    /// Registered pass name
    pub pass: String,

    /// Page the pass is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Pass-specific parameters
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl PassInstruction {
    /// Create an invocation with no page or parameters.
    pub fn new(pass: impl Into<String>) -> Self {
        Self {
            pass: pass.into(),
            page: None,
            params: Map::new(),
        }
    }

    /// Scope to a page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Per-run overrides read from `instructions.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instructions {
    /// Volume override (string or number)
    #[serde(deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,

    /// Issue override (string or number)
    #[serde(deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,

    /// Font size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,

    /// Line spacing multiple
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f32>,

    /// Font family
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    /// Keep pages up to and including this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_after_page: Option<u32>,

    /// Delete everything after the last editorial page
    #[serde(skip_serializing_if = "is_false")]
    pub delete_after_editorial: bool,

    /// Remove duplicated horizontal lines
    #[serde(skip_serializing_if = "is_false")]
    pub cleanup_black_lines: bool,

    /// Autofit the first table on this page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autofit_table_on_page: Option<u32>,

    /// Apply the font from this page instead of the article insertion point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_from_page: Option<u32>,

    /// Apply line spacing from this page instead of the article insertion point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing_from_page: Option<u32>,

    /// Override the front cover / footer layout switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_front_and_footer: Option<bool>,

    /// Section column layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnsInstruction>,

    /// Page borders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_borders: Option<PageBordersInstruction>,

    /// Finishing passes run after assembly, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub finishing_passes: Vec<PassInstruction>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl Instructions {
    /// Parse from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from JSON text, dropping keys whose values have the wrong type.
    ///
    /// The text must still be a JSON object; each rejected key is logged.
    pub fn from_json_lenient(json: &str) -> Result<Self> {
        let mut map: Map<String, Value> = serde_json::from_str(json)?;
        if let Ok(instructions) = serde_json::from_value(Value::Object(map.clone())) {
            return Ok(instructions);
        }

        let keys: Vec<String> = map.keys().cloned().collect();
        for key in keys {
            let Some(value) = map.get(&key) else {
                continue;
            };
            let single = Map::from_iter([(key.clone(), value.clone())]);
            if let Err(e) = serde_json::from_value::<Self>(Value::Object(single)) {
                warn!("Ignoring instruction {}: {}", key, e);
                map.remove(&key);
            }
        }
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load `instructions.json` from a content directory.
    ///
    /// A missing file gives an empty overlay; an unreadable or malformed
    /// file is logged and also gives an empty overlay. Single keys with the
    /// wrong type are dropped and the rest of the overlay is kept.
    pub fn load(content_dir: &Path) -> Self {
        Self::load_file(&content_dir.join(INSTRUCTIONS_FILE))
    }

    /// Load an overlay file, falling back to an empty overlay.
    pub fn load_file(path: &Path) -> Self {
        if !path.exists() {
            debug!("No instructions at {}", path.display());
            return Self::default();
        }
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match Self::from_json_lenient(&text) {
            Ok(instructions) => {
                debug!("Loaded instructions from {}", path.display());
                instructions
            }
            Err(e) => {
                warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write the overlay as pretty JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check if the overlay changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_volume_and_issue_accept_numbers() {
        let parsed = Instructions::from_json(r#"{"volume": 4, "issue": "6"}"#).unwrap();
        assert_eq!(parsed.volume.as_deref(), Some("4"));
        assert_eq!(parsed.issue.as_deref(), Some("6"));
        assert!(parsed.font_size.is_none());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let parsed = Instructions::from_json(r#"{"font_size": 14, "mystery": [1, 2]}"#).unwrap();
        assert_eq!(parsed.font_size, Some(14.0));
    }

    #[test]
    fn test_columns_and_borders_forms() {
        let parsed = Instructions::from_json(
            r#"{"columns": 2, "page_borders": true, "finishing_passes": [{"pass": "autofit_table", "page": 3}]}"#,
        )
        .unwrap();
        let columns = parsed.columns.unwrap();
        assert_eq!(columns.count(), 2);
        assert_eq!(columns.spacing(), ColumnsInstruction::DEFAULT_SPACING);
        let borders = parsed.page_borders.unwrap();
        assert!(borders.enabled());
        assert!(!borders.center_line());
        assert_eq!(parsed.finishing_passes[0].page, Some(3));

        let parsed = Instructions::from_json(
            r#"{"columns": {"count": 3, "spacing": 360, "section": 1}, "page_borders": {"center_line": true}}"#,
        )
        .unwrap();
        let columns = parsed.columns.unwrap();
        assert_eq!((columns.count(), columns.spacing(), columns.section()), (3, 360, 1));
        assert!(parsed.page_borders.unwrap().center_line());
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = TempDir::new().unwrap();
        assert!(Instructions::load(dir.path()).is_empty());

        std::fs::write(dir.path().join(INSTRUCTIONS_FILE), "{ not json").unwrap();
        assert!(Instructions::load(dir.path()).is_empty());
    }

    #[test]
    fn test_wrong_typed_key_keeps_rest_of_overlay() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(INSTRUCTIONS_FILE),
            r#"{"volume": "4", "issue": 6, "font_size": "14", "columns": "two", "cleanup_black_lines": true}"#,
        )
        .unwrap();

        let loaded = Instructions::load(dir.path());
        assert_eq!(loaded.volume.as_deref(), Some("4"));
        assert_eq!(loaded.issue.as_deref(), Some("6"));
        assert!(loaded.cleanup_black_lines);
        assert_eq!(loaded.font_size, None);
        assert_eq!(loaded.columns, None);
    }

    #[test]
    fn test_lenient_rejects_non_object() {
        assert!(Instructions::from_json_lenient("[1, 2]").is_err());
        assert!(Instructions::from_json("{\"font_size\": \"14\"}").is_err());
    }

    #[test]
    fn test_write_and_reload() {
        let dir = TempDir::new().unwrap();
        let instructions = Instructions {
            volume: Some("7".to_string()),
            cleanup_black_lines: true,
            finishing_passes: vec![PassInstruction::new("remove_extra_spaces").with_page(2)],
            ..Instructions::default()
        };
        let path = dir.path().join(INSTRUCTIONS_FILE);
        instructions.write_to(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("font_size"));
        assert_eq!(Instructions::load(dir.path()), instructions);
    }
}

//! Layout formatting: columns, page borders, footer table, table autofit,
//! horizontal-line cleanup, fonts and line spacing.
//!
//! Section- and part-level changes go through a [`FormattingCapability`],
//! chosen at runtime by [`select_capability`]. Callers that get `None`
//! skip the change with a debug log.

use crate::error::Result;
use crate::model::paragraph::{
    self, has_page_break, new_paragraph, paragraph_text, set_alignment, P, R,
};
use crate::model::section::{set_title_page, SECT_PR_ORDER};
use crate::model::table::{self, new_cell, TBLPR_ORDER};
use crate::model::{
    Alignment, Document, HeaderFooterKind, PageMap, PartKind, XmlElement, NS_O, NS_V,
};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Id given to the center rule shape so it is only drawn once.
pub const CENTER_RULE_ID: &str = "JournalCenterRule";

/// Footer label used when none is configured.
pub const DEFAULT_FOOTER_LABEL: &str = "ABNFF Journal";

/// Where a capability comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Typed helpers of the document model
    Native,
    /// Hand-built WordprocessingML fragments
    RawMarkup,
}

/// A formatting operation a capability may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Multi-column section layout
    Columns,
    /// Page borders
    PageBorders,
    /// Centered vertical rule in the header
    CenterRule,
    /// Three-cell footer table with a page field
    FooterTable,
    /// Table layout toggle
    TableAutofit,
}

/// One border side (`w:top`, `w:left`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderSpec {
    /// Border style (`single`, `double`, `nil`, ...)
    #[serde(default = "default_border_val")]
    pub val: String,

    /// Width in eighths of a point
    #[serde(default = "default_border_sz")]
    pub sz: u32,

    /// Distance from text/page edge in points
    #[serde(default)]
    pub space: u32,

    /// Hex color or `auto`
    #[serde(default = "default_border_color")]
    pub color: String,
}

fn default_border_val() -> String {
    "single".to_string()
}

fn default_border_sz() -> u32 {
    4
}

fn default_border_color() -> String {
    "auto".to_string()
}

impl Default for BorderSpec {
    fn default() -> Self {
        Self {
            val: default_border_val(),
            sz: default_border_sz(),
            space: 24,
            color: default_border_color(),
        }
    }
}

impl BorderSpec {
    fn to_element(&self, side: &str) -> XmlElement {
        XmlElement::new(format!("w:{}", side))
            .with_attr("w:val", self.val.as_str())
            .with_attr("w:sz", self.sz.to_string())
            .with_attr("w:space", self.space.to_string())
            .with_attr("w:color", self.color.as_str())
    }
}

/// Page border sides; missing sides get no border.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBorders {
    /// Top border
    #[serde(default)]
    pub top: Option<BorderSpec>,
    /// Left border
    #[serde(default)]
    pub left: Option<BorderSpec>,
    /// Bottom border
    #[serde(default)]
    pub bottom: Option<BorderSpec>,
    /// Right border
    #[serde(default)]
    pub right: Option<BorderSpec>,
}

impl PageBorders {
    /// Same border on all four sides.
    pub fn uniform(spec: BorderSpec) -> Self {
        Self {
            top: Some(spec.clone()),
            left: Some(spec.clone()),
            bottom: Some(spec.clone()),
            right: Some(spec),
        }
    }

    fn to_element(&self) -> XmlElement {
        let mut el = XmlElement::new("w:pgBorders").with_attr("w:offsetFrom", "page");
        for (side, spec) in [
            ("top", &self.top),
            ("left", &self.left),
            ("bottom", &self.bottom),
            ("right", &self.right),
        ] {
            if let Some(spec) = spec {
                el.push(spec.to_element(side));
            }
        }
        el
    }
}

/// Formatting operations the host model may or may not support.
///
/// Every operation defaults to "unsupported" (`Ok(false)`).
pub trait FormattingCapability {
    /// Where this capability comes from.
    fn kind(&self) -> CapabilityKind;

    /// Check if a feature is implemented.
    fn supports(&self, feature: Feature) -> bool;

    /// Lay a section out in `count` columns with `spacing` twips between them.
    fn set_columns(&self, _doc: &mut Document, _section: usize, _count: u32, _spacing: u32) -> Result<bool> {
        Ok(false)
    }

    /// Replace a section's page borders.
    fn apply_page_borders(&self, _doc: &mut Document, _section: usize, _borders: &PageBorders) -> Result<bool> {
        Ok(false)
    }

    /// Draw a centered vertical rule from the section's default header.
    fn add_center_rule(&self, _doc: &mut Document, _section: usize) -> Result<bool> {
        Ok(false)
    }

    /// Install the three-cell footer table and suppress the first-page footer.
    fn install_footer_table(&self, _doc: &mut Document, _section: usize, _left: &str, _right: &str) -> Result<bool> {
        Ok(false)
    }

    /// Switch a table between autofit and fixed layout.
    fn set_table_autofit(&self, _table: &mut XmlElement, _autofit: bool) -> bool {
        false
    }
}

/// Formatting through the model's typed helpers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFormatting;

impl FormattingCapability for NativeFormatting {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::Native
    }

    fn supports(&self, feature: Feature) -> bool {
        matches!(feature, Feature::TableAutofit)
    }

    fn set_table_autofit(&self, table: &mut XmlElement, autofit: bool) -> bool {
        if !table::is_table(table) {
            return false;
        }
        table::set_autofit(table, autofit);
        true
    }
}

/// Formatting by writing WordprocessingML directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawMarkupFormatting;

impl FormattingCapability for RawMarkupFormatting {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::RawMarkup
    }

    fn supports(&self, _feature: Feature) -> bool {
        true
    }

    fn set_columns(&self, doc: &mut Document, section: usize, count: u32, spacing: u32) -> Result<bool> {
        let sect = doc.ensure_section(section)?;
        let cols = sect.ensure_child_ordered("w:cols", SECT_PR_ORDER);
        cols.remove_children("w:col");
        cols.remove_attr("w:equalWidth");
        cols.set_attr("w:num", count.max(1).to_string());
        cols.set_attr("w:space", spacing.to_string());
        Ok(true)
    }

    fn apply_page_borders(&self, doc: &mut Document, section: usize, borders: &PageBorders) -> Result<bool> {
        let sect = doc.ensure_section(section)?;
        sect.remove_children("w:pgBorders");
        sect.insert_ordered(borders.to_element(), SECT_PR_ORDER);
        Ok(true)
    }

    fn add_center_rule(&self, doc: &mut Document, section: usize) -> Result<bool> {
        let name = match doc.header_footer_part(section, PartKind::Header, HeaderFooterKind::Default)? {
            Some(name) => name,
            None => doc.add_header_footer(
                section,
                PartKind::Header,
                HeaderFooterKind::Default,
                vec![new_paragraph("")],
            )?,
        };
        let Some(header) = doc.part_mut(&name)? else {
            return Ok(false);
        };

        let root = &mut header.root;
        let exists = root.any_descendant(|el| {
            el.name == "v:shape" && el.attr("id") == Some(CENTER_RULE_ID)
        });
        if exists {
            return Ok(true);
        }
        for (prefix, ns) in [("v", NS_V), ("o", NS_O)] {
            let key = format!("xmlns:{}", prefix);
            if root.attr(&key).is_none() {
                root.set_attr(key, ns);
            }
        }

        let run = XmlElement::new(R).with_child(XmlElement::new("w:pict").with_child(center_rule_shape()));
        match root.child_mut(P) {
            Some(p) => p.push(run),
            None => root.push(XmlElement::new(P).with_child(run)),
        }
        Ok(true)
    }

    fn install_footer_table(&self, doc: &mut Document, section: usize, left: &str, right: &str) -> Result<bool> {
        doc.replace_header_footer(
            section,
            PartKind::Footer,
            HeaderFooterKind::Default,
            vec![footer_table(left, right), XmlElement::new(P)],
        )?;
        doc.replace_header_footer(
            section,
            PartKind::Footer,
            HeaderFooterKind::First,
            vec![XmlElement::new(P)],
        )?;
        set_title_page(doc.ensure_section(section)?);
        Ok(true)
    }

    fn set_table_autofit(&self, table: &mut XmlElement, autofit: bool) -> bool {
        if !table::is_table(table) {
            return false;
        }
        let kind = if autofit { "autofit" } else { "fixed" };
        table
            .ensure_child_ordered("w:tblPr", &["w:tblPr"])
            .ensure_child_ordered("w:tblLayout", TBLPR_ORDER)
            .set_attr("w:type", kind);
        true
    }
}

/// Pick the first capability that supports `feature`, preferring native helpers.
///
/// Returns `None` when the document exposes no body to work on.
pub fn select_capability(doc: &Document, feature: Feature) -> Option<Box<dyn FormattingCapability>> {
    if !doc.root().has_child("w:body") {
        return None;
    }
    let candidates: [Box<dyn FormattingCapability>; 2] =
        [Box::new(NativeFormatting), Box::new(RawMarkupFormatting)];
    candidates.into_iter().find(|cap| cap.supports(feature))
}

fn center_rule_shape() -> XmlElement {
    XmlElement::new("v:shape")
        .with_attr("id", CENTER_RULE_ID)
        .with_attr("o:spid", "_x0000_s1025")
        .with_attr(
            "style",
            "position:absolute;margin-left:0;margin-top:0;width:0;height:648pt;z-index:-251657216;\
             mso-position-horizontal:center;mso-position-horizontal-relative:page;\
             mso-position-vertical:center;mso-position-vertical-relative:page",
        )
        .with_attr("coordsize", "21600,21600")
        .with_attr("path", "m10800,l10800,21600e")
        .with_attr("filled", "f")
        .with_attr("strokecolor", "black")
        .with_attr("strokeweight", ".75pt")
        .with_attr("o:allowincell", "f")
}

fn field_run(fld_type: &str) -> XmlElement {
    XmlElement::new(R).with_child(XmlElement::new("w:fldChar").with_attr("w:fldCharType", fld_type))
}

/// Runs of a live PAGE field with a cached value of 1.
pub fn page_field_runs() -> Vec<XmlElement> {
    vec![
        field_run("begin"),
        XmlElement::new(R).with_child(
            XmlElement::new("w:instrText")
                .with_attr("xml:space", "preserve")
                .with_text(" PAGE "),
        ),
        field_run("separate"),
        XmlElement::new(R).with_child(XmlElement::new("w:t").with_text("1")),
        field_run("end"),
    ]
}

/// Borderless three-cell footer table: left label, page field, right label.
pub fn footer_table(left: &str, right: &str) -> XmlElement {
    let nil = |side: &str| XmlElement::new(format!("w:{}", side)).with_attr("w:val", "nil");
    let mut borders = XmlElement::new("w:tblBorders");
    for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        borders.push(nil(side));
    }
    let props = XmlElement::new("w:tblPr")
        .with_child(
            XmlElement::new("w:tblW")
                .with_attr("w:w", "5000")
                .with_attr("w:type", "pct"),
        )
        .with_child(borders)
        .with_child(XmlElement::new("w:tblLayout").with_attr("w:type", "fixed"))
        .with_child(XmlElement::new("w:tblLook").with_attr("w:val", "0000"));

    let mut grid = XmlElement::new("w:tblGrid");
    for _ in 0..3 {
        grid.push(XmlElement::new("w:gridCol").with_attr("w:w", "3120"));
    }

    let mut left_cell = new_cell(left);
    let mut page_cell = new_cell("");
    let mut right_cell = new_cell(right);
    for (cell, alignment) in [
        (&mut left_cell, Alignment::Left),
        (&mut page_cell, Alignment::Center),
        (&mut right_cell, Alignment::Right),
    ] {
        if let Some(p) = cell.child_mut(P) {
            set_alignment(p, alignment);
        }
    }
    if let Some(p) = page_cell.child_mut(P) {
        for run in page_field_runs() {
            p.push(run);
        }
    }

    let row = XmlElement::new("w:tr")
        .with_child(left_cell)
        .with_child(page_cell)
        .with_child(right_cell);
    XmlElement::new(table::TBL)
        .with_child(props)
        .with_child(grid)
        .with_child(row)
}

/// Set a section's column count and spacing (twips).
pub fn set_columns(doc: &mut Document, section: usize, count: u32, spacing: u32) -> Result<bool> {
    match select_capability(doc, Feature::Columns) {
        Some(cap) => cap.set_columns(doc, section, count, spacing),
        None => {
            debug!("Columns unsupported, skipped");
            Ok(false)
        }
    }
}

/// Replace a section's page borders.
pub fn apply_page_borders(doc: &mut Document, section: usize, borders: &PageBorders) -> Result<bool> {
    match select_capability(doc, Feature::PageBorders) {
        Some(cap) => cap.apply_page_borders(doc, section, borders),
        None => {
            debug!("Page borders unsupported, skipped");
            Ok(false)
        }
    }
}

/// Default single page borders, plus a centered vertical rule when asked.
pub fn add_page_borders_with_rule(doc: &mut Document, section: usize, center_line: bool) -> Result<bool> {
    let applied = apply_page_borders(doc, section, &PageBorders::uniform(BorderSpec::default()))?;
    if !center_line {
        return Ok(applied);
    }
    match select_capability(doc, Feature::CenterRule) {
        Some(cap) => Ok(applied && cap.add_center_rule(doc, section)?),
        None => {
            debug!("Center rule unsupported, skipped");
            Ok(applied)
        }
    }
}

/// Install the footer table on a section.
pub fn install_footer_table(doc: &mut Document, section: usize, left: &str, right: &str) -> Result<bool> {
    match select_capability(doc, Feature::FooterTable) {
        Some(cap) => cap.install_footer_table(doc, section, left, right),
        None => {
            debug!("Footer table unsupported, skipped");
            Ok(false)
        }
    }
}

/// Make the first table on `page` autofit its contents.
pub fn autofit_first_table(doc: &mut Document, page: u32) -> bool {
    let snapshot = doc.snapshot();
    let pages = PageMap::from_blocks(&snapshot);
    let Some(index) = pages
        .blocks_on(page)
        .iter()
        .copied()
        .find(|&i| snapshot[i].is_table())
    else {
        debug!("No table on page {}", page);
        return false;
    };
    let Some(cap) = select_capability(doc, Feature::TableAutofit) else {
        debug!("Table autofit unsupported, skipped");
        return false;
    };
    match doc.block_mut(index) {
        Some(table) => cap.set_table_autofit(table, true),
        None => false,
    }
}

fn rule_text_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(?:_{3,}|-{3,}|={3,}|—{3,})\s*$").expect("valid rule pattern"))
}

/// Check whether a block renders as a horizontal line.
pub fn is_horizontal_line(block: &XmlElement) -> bool {
    if block.name != P || has_page_break(block) {
        return false;
    }
    let text = paragraph_text(block);
    if rule_text_pattern().is_match(&text) {
        return true;
    }
    if !text.trim().is_empty() {
        return false;
    }
    let bordered = block
        .child("w:pPr")
        .and_then(|props| props.child("w:pBdr"))
        .is_some();
    bordered || block.any_descendant(|el| el.attr("o:hr") == Some("t"))
}

/// Remove horizontal lines that directly follow another one.
pub fn cleanup_horizontal_lines(doc: &mut Document) -> usize {
    let lines: Vec<bool> = doc.blocks().map(is_horizontal_line).collect();
    let duplicates: Vec<usize> = (1..lines.len())
        .filter(|&i| lines[i] && lines[i - 1])
        .collect();
    for &index in duplicates.iter().rev() {
        doc.remove_block(index);
    }
    if !duplicates.is_empty() {
        debug!("Removed {} duplicate horizontal lines", duplicates.len());
    }
    duplicates.len()
}

/// Set font size and/or family on every run from block `from` onward.
pub fn apply_font(doc: &mut Document, from: usize, size: Option<f32>, family: Option<&str>) -> usize {
    if size.is_none() && family.is_none() {
        return 0;
    }
    let count = doc.block_count();
    for index in from..count {
        if let Some(block) = doc.block_mut(index) {
            if let Some(size) = size {
                paragraph::set_font_size(block, size);
            }
            if let Some(family) = family {
                paragraph::set_font_family(block, family);
            }
        }
    }
    count.saturating_sub(from)
}

/// Set line spacing on every paragraph from block `from` onward.
pub fn apply_line_spacing(doc: &mut Document, from: usize, spacing: f32) -> usize {
    let count = doc.block_count();
    for index in from..count {
        if let Some(block) = doc.block_mut(index) {
            paragraph::set_line_spacing(block, spacing);
        }
    }
    count.saturating_sub(from)
}

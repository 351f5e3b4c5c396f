//! Paragraph and run level helpers over `w:p` elements.

use super::xml::{XmlElement, XmlNode};
use serde::{Deserialize, Serialize};

/// Qualified name of a paragraph element.
pub const P: &str = "w:p";
/// Qualified name of a run element.
pub const R: &str = "w:r";

/// Child order of `w:pPr` required by the WordprocessingML schema.
pub const PPR_ORDER: &[&str] = &[
    "w:pStyle",
    "w:keepNext",
    "w:keepLines",
    "w:pageBreakBefore",
    "w:framePr",
    "w:widowControl",
    "w:numPr",
    "w:suppressLineNumbers",
    "w:pBdr",
    "w:shd",
    "w:tabs",
    "w:suppressAutoHyphens",
    "w:kinsoku",
    "w:wordWrap",
    "w:overflowPunct",
    "w:topLinePunct",
    "w:autoSpaceDE",
    "w:autoSpaceDN",
    "w:bidi",
    "w:adjustRightInd",
    "w:snapToGrid",
    "w:spacing",
    "w:ind",
    "w:contextualSpacing",
    "w:mirrorIndents",
    "w:suppressOverlap",
    "w:jc",
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// Child order of `w:rPr` required by the WordprocessingML schema.
pub const RPR_ORDER: &[&str] = &[
    "w:rStyle",
    "w:rFonts",
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:outline",
    "w:shadow",
    "w:emboss",
    "w:imprint",
    "w:noProof",
    "w:snapToGrid",
    "w:vanish",
    "w:webHidden",
    "w:color",
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

const PBDR_ORDER: &[&str] = &["w:top", "w:left", "w:bottom", "w:right", "w:between", "w:bar"];

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// Value of `w:jc/@w:val`.
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Build a paragraph holding `text` in a single run.
pub fn new_paragraph(text: &str) -> XmlElement {
    let mut p = XmlElement::new(P);
    set_paragraph_text(&mut p, text);
    p
}

/// A run holding a manual page break.
pub fn page_break_run() -> XmlElement {
    XmlElement::new(R).with_child(XmlElement::new("w:br").with_attr("w:type", "page"))
}

/// Plain text of a paragraph.
///
/// Tabs become `\t` and text-wrapping breaks `\n`; page and column breaks
/// contribute nothing. Deleted revisions are skipped.
pub fn paragraph_text(p: &XmlElement) -> String {
    let mut out = String::new();
    collect_text(p, &mut out);
    out
}

fn collect_text(el: &XmlElement, out: &mut String) {
    for child in el.elements() {
        match child.name.as_str() {
            R => run_text(child, out),
            "w:pPr" | "w:del" | "w:moveFrom" => {}
            _ => collect_text(child, out),
        }
    }
}

fn run_text(run: &XmlElement, out: &mut String) {
    for item in run.elements() {
        match item.name.as_str() {
            "w:t" => out.push_str(&item.text()),
            "w:tab" | "w:ptab" => out.push('\t'),
            "w:cr" => out.push('\n'),
            "w:br" => match item.attr("w:type") {
                None | Some("textWrapping") => out.push('\n'),
                _ => {}
            },
            "w:noBreakHyphen" => out.push('-'),
            _ => {}
        }
    }
}

/// Check whether an element contains a manual page break (`w:br w:type="page"`).
pub fn has_page_break(el: &XmlElement) -> bool {
    el.any_descendant(|d| d.name == "w:br" && d.attr("w:type") == Some("page"))
}

/// Replace the text of a paragraph.
///
/// Keeps `w:pPr`, reuses the first run's `w:rPr`, writes `\n` as `w:br`
/// and `\t` as `w:tab`. A manual page break in the old content is
/// re-appended so page numbering is unchanged.
pub fn set_paragraph_text(p: &mut XmlElement, text: &str) {
    let run_props = p.find_all(R).first().and_then(|r| r.child("w:rPr").cloned());
    let had_break = has_page_break(p);

    p.children
        .retain(|node| matches!(node, XmlNode::Element(el) if el.name == "w:pPr"));

    if !text.is_empty() {
        let mut run = XmlElement::new(R);
        if let Some(props) = run_props {
            run.push(props);
        }
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                run.push(XmlElement::new("w:br"));
            }
            for (j, chunk) in line.split('\t').enumerate() {
                if j > 0 {
                    run.push(XmlElement::new("w:tab"));
                }
                if !chunk.is_empty() {
                    run.push(text_element(chunk));
                }
            }
        }
        p.push(run);
    }

    if had_break {
        p.push(page_break_run());
    }
}

fn text_element(text: &str) -> XmlElement {
    let mut t = XmlElement::new("w:t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    t.with_text(text)
}

/// Replace `search` with `replace` inside each text node; returns the number of nodes changed.
///
/// Matching is run-local: a phrase split across runs is left alone.
pub fn replace_in_runs(el: &mut XmlElement, search: &str, replace: &str) -> usize {
    if search.is_empty() {
        return 0;
    }
    let mut changed = 0;
    el.for_each_named_mut("w:t", &mut |t: &mut XmlElement| {
        let text = t.text();
        if text.contains(search) {
            let updated = text.replace(search, replace);
            mark_space(t, &updated);
            t.set_text(updated);
            changed += 1;
        }
    });
    changed
}

/// Collapse repeated occurrences of `pattern` to a single space inside each text node.
pub fn collapse_in_runs(el: &mut XmlElement, pattern: &str) -> usize {
    if pattern.is_empty() || pattern == " " {
        return 0;
    }
    let mut changed = 0;
    el.for_each_named_mut("w:t", &mut |t: &mut XmlElement| {
        let mut text = t.text();
        if !text.contains(pattern) {
            return;
        }
        while text.contains(pattern) {
            text = text.replace(pattern, " ");
        }
        mark_space(t, &text);
        t.set_text(text);
        changed += 1;
    });
    changed
}

fn mark_space(t: &mut XmlElement, text: &str) {
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
}

/// Get (creating if needed) the `w:pPr` of a paragraph.
pub fn paragraph_properties(p: &mut XmlElement) -> &mut XmlElement {
    p.ensure_child_ordered("w:pPr", &["w:pPr"])
}

/// Get (creating if needed) the `w:rPr` of a run.
pub fn run_properties(run: &mut XmlElement) -> &mut XmlElement {
    run.ensure_child_ordered("w:rPr", &["w:rPr"])
}

/// Set the alignment of a paragraph.
pub fn set_alignment(p: &mut XmlElement, alignment: Alignment) {
    paragraph_properties(p)
        .ensure_child_ordered("w:jc", PPR_ORDER)
        .set_attr("w:val", alignment.as_ooxml());
}

/// Give a paragraph a single bottom border.
pub fn set_bottom_border(p: &mut XmlElement) {
    let bottom = XmlElement::new("w:bottom")
        .with_attr("w:val", "single")
        .with_attr("w:sz", "6")
        .with_attr("w:space", "1")
        .with_attr("w:color", "auto");
    paragraph_properties(p)
        .ensure_child_ordered("w:pBdr", PPR_ORDER)
        .replace_child_ordered(bottom, PBDR_ORDER);
}

/// Set or clear bold on every run below `el`.
pub fn set_bold(el: &mut XmlElement, bold: bool) {
    for_each_run(el, &mut |run: &mut XmlElement| {
        let props = run_properties(run);
        if bold {
            props.remove_children("w:b");
            props.insert_ordered(XmlElement::new("w:b"), RPR_ORDER);
        } else {
            props.remove_children("w:b");
        }
    });
}

/// Set the font size (points) on every run below `el`.
pub fn set_font_size(el: &mut XmlElement, points: f32) {
    let half_points = (points * 2.0).round().max(1.0) as u32;
    let value = half_points.to_string();
    for_each_run(el, &mut |run: &mut XmlElement| {
        let props = run_properties(run);
        props
            .ensure_child_ordered("w:sz", RPR_ORDER)
            .set_attr("w:val", value.as_str());
        props
            .ensure_child_ordered("w:szCs", RPR_ORDER)
            .set_attr("w:val", value.as_str());
    });
}

/// Set the font family on every run below `el`.
pub fn set_font_family(el: &mut XmlElement, family: &str) {
    for_each_run(el, &mut |run: &mut XmlElement| {
        let fonts = run_properties(run).ensure_child_ordered("w:rFonts", RPR_ORDER);
        for slot in ["w:ascii", "w:hAnsi", "w:cs", "w:eastAsia"] {
            fonts.set_attr(slot, family);
        }
        for theme in ["w:asciiTheme", "w:hAnsiTheme", "w:cstheme", "w:eastAsiaTheme"] {
            fonts.remove_attr(theme);
        }
    });
}

/// Set proportional line spacing on `el` (if a paragraph) and every paragraph below it.
pub fn set_line_spacing(el: &mut XmlElement, multiple: f32) {
    let line = ((multiple * 240.0).round().max(1.0) as u32).to_string();
    let mut apply = |p: &mut XmlElement| {
        let spacing = paragraph_properties(p).ensure_child_ordered("w:spacing", PPR_ORDER);
        spacing.set_attr("w:line", line.as_str());
        spacing.set_attr("w:lineRule", "auto");
    };
    if el.name == P {
        apply(el);
    }
    el.for_each_named_mut(P, &mut apply);
}

/// Font size of the first run carrying one, in points.
pub fn run_font_size(run: &XmlElement) -> Option<f32> {
    run.child("w:rPr")?
        .child("w:sz")?
        .attr("w:val")?
        .parse::<f32>()
        .ok()
        .map(|half| half / 2.0)
}

/// Whether a run is bold.
pub fn run_is_bold(run: &XmlElement) -> bool {
    run.child("w:rPr")
        .and_then(|props| props.child("w:b"))
        .is_some_and(|b| !matches!(b.attr("w:val"), Some("0") | Some("false")))
}

fn for_each_run<F: FnMut(&mut XmlElement)>(el: &mut XmlElement, f: &mut F) {
    if el.name == R {
        f(el);
        return;
    }
    el.for_each_named_mut(R, f);
}

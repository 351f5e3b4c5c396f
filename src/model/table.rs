//! Table helpers over `w:tbl` elements.

use super::paragraph::{new_paragraph, paragraph_text, set_paragraph_text, P};
use super::xml::XmlElement;

/// Qualified name of a table element.
pub const TBL: &str = "w:tbl";

/// Child order of `w:tblPr` required by the WordprocessingML schema.
pub const TBLPR_ORDER: &[&str] = &[
    "w:tblStyle",
    "w:tblpPr",
    "w:tblOverlap",
    "w:bidiVisual",
    "w:tblStyleRowBandSize",
    "w:tblStyleColBandSize",
    "w:tblW",
    "w:jc",
    "w:tblCellSpacing",
    "w:tblInd",
    "w:tblBorders",
    "w:shd",
    "w:tblLayout",
    "w:tblCellMar",
    "w:tblLook",
    "w:tblCaption",
    "w:tblDescription",
];

const TBL_ORDER: &[&str] = &["w:tblPr", "w:tblGrid", "w:tr"];

/// Check whether an element is a table.
pub fn is_table(el: &XmlElement) -> bool {
    el.name == TBL
}

/// Build an empty `rows` x `cols` table with equal auto-width cells.
pub fn new_table(rows: usize, cols: usize) -> XmlElement {
    let props = XmlElement::new("w:tblPr")
        .with_child(
            XmlElement::new("w:tblW")
                .with_attr("w:w", "0")
                .with_attr("w:type", "auto"),
        )
        .with_child(XmlElement::new("w:tblLook").with_attr("w:val", "04A0"));

    let mut grid = XmlElement::new("w:tblGrid");
    for _ in 0..cols {
        grid.push(XmlElement::new("w:gridCol"));
    }

    let mut table = XmlElement::new(TBL).with_child(props).with_child(grid);
    for _ in 0..rows {
        let mut row = XmlElement::new("w:tr");
        for _ in 0..cols {
            row.push(new_cell(""));
        }
        table.push(row);
    }
    table
}

/// Build a table cell holding one paragraph.
pub fn new_cell(text: &str) -> XmlElement {
    XmlElement::new("w:tc")
        .with_child(
            XmlElement::new("w:tcPr").with_child(
                XmlElement::new("w:tcW")
                    .with_attr("w:w", "0")
                    .with_attr("w:type", "auto"),
            ),
        )
        .with_child(new_paragraph(text))
}

/// Get (creating if needed) the `w:tblPr` of a table.
pub fn table_properties(table: &mut XmlElement) -> &mut XmlElement {
    table.ensure_child_ordered("w:tblPr", TBL_ORDER)
}

/// Whether the table lays out automatically (no fixed layout).
pub fn is_autofit(table: &XmlElement) -> bool {
    table
        .child("w:tblPr")
        .and_then(|props| props.child("w:tblLayout"))
        .and_then(|layout| layout.attr("w:type"))
        != Some("fixed")
}

/// Switch the table between autofit and fixed layout.
pub fn set_autofit(table: &mut XmlElement, autofit: bool) {
    let kind = if autofit { "autofit" } else { "fixed" };
    table_properties(table)
        .ensure_child_ordered("w:tblLayout", TBLPR_ORDER)
        .set_attr("w:type", kind);
}

fn cell(table: &XmlElement, row: usize, col: usize) -> Option<&XmlElement> {
    table
        .elements()
        .filter(|el| el.name == "w:tr")
        .nth(row)?
        .elements()
        .filter(|el| el.name == "w:tc")
        .nth(col)
}

fn cell_mut(table: &mut XmlElement, row: usize, col: usize) -> Option<&mut XmlElement> {
    table
        .elements_mut()
        .filter(|el| el.name == "w:tr")
        .nth(row)?
        .elements_mut()
        .filter(|el| el.name == "w:tc")
        .nth(col)
}

/// Text of a cell, paragraphs joined by `\n`.
pub fn cell_text(table: &XmlElement, row: usize, col: usize) -> Option<String> {
    let cell = cell(table, row, col)?;
    Some(
        cell.elements()
            .filter(|el| el.name == P)
            .map(paragraph_text)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Set the text of a cell's first paragraph; returns false if the cell does not exist.
pub fn set_cell_text(table: &mut XmlElement, row: usize, col: usize, text: &str) -> bool {
    let Some(cell) = cell_mut(table, row, col) else {
        return false;
    };
    match cell.child_mut(P) {
        Some(p) => set_paragraph_text(p, text),
        None => cell.push(new_paragraph(text)),
    }
    true
}

/// Number of rows.
pub fn row_count(table: &XmlElement) -> usize {
    table.elements().filter(|el| el.name == "w:tr").count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_shape() {
        let table = new_table(2, 3);
        assert!(is_table(&table));
        assert_eq!(row_count(&table), 2);
        assert_eq!(table.find_all("w:gridCol").len(), 3);
        assert_eq!(table.find_all("w:tc").len(), 6);
        assert!(is_autofit(&table));
    }

    #[test]
    fn test_cell_text_round_trip() {
        let mut table = new_table(1, 2);
        assert!(set_cell_text(&mut table, 0, 1, "target"));
        assert_eq!(cell_text(&table, 0, 1).as_deref(), Some("target"));
        assert_eq!(cell_text(&table, 0, 0).as_deref(), Some(""));
        assert!(!set_cell_text(&mut table, 5, 0, "nope"));
        assert!(cell_text(&table, 0, 9).is_none());
    }

    #[test]
    fn test_set_autofit() {
        let mut table = new_table(1, 1);
        set_autofit(&mut table, false);
        assert!(!is_autofit(&table));
        set_autofit(&mut table, true);
        assert!(is_autofit(&table));

        let props = table.child("w:tblPr").unwrap();
        let names: Vec<&str> = props.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:tblW", "w:tblLayout", "w:tblLook"]);
        assert_eq!(
            props.child("w:tblLayout").unwrap().attr("w:type"),
            Some("autofit")
        );
    }
}

//! Section properties (`w:sectPr`) helpers.

use super::xml::XmlElement;

/// Qualified name of a section properties element.
pub const SECT_PR: &str = "w:sectPr";

/// Child order of `w:sectPr` required by the WordprocessingML schema.
pub const SECT_PR_ORDER: &[&str] = &[
    "w:headerReference",
    "w:footerReference",
    "w:footnotePr",
    "w:endnotePr",
    "w:type",
    "w:pgSz",
    "w:pgMar",
    "w:paperSrc",
    "w:pgBorders",
    "w:lnNumType",
    "w:pgNumType",
    "w:cols",
    "w:formProt",
    "w:vAlign",
    "w:noEndnote",
    "w:titlePg",
    "w:textDirection",
    "w:bidi",
    "w:rtlGutter",
    "w:docGrid",
    "w:printerSettings",
    "w:sectPrChange",
];

/// Which page a header or footer applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderFooterKind {
    /// Every page not covered by another kind
    Default,
    /// First page of the section (needs `w:titlePg`)
    First,
    /// Even pages (needs even/odd headers enabled)
    Even,
}

impl HeaderFooterKind {
    /// Value of the reference's `w:type` attribute.
    pub fn as_ooxml(self) -> &'static str {
        match self {
            HeaderFooterKind::Default => "default",
            HeaderFooterKind::First => "first",
            HeaderFooterKind::Even => "even",
        }
    }
}

/// Header or footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// `w:hdr` part
    Header,
    /// `w:ftr` part
    Footer,
}

impl PartKind {
    /// Reference element inside `w:sectPr`.
    pub fn reference_element(self) -> &'static str {
        match self {
            PartKind::Header => "w:headerReference",
            PartKind::Footer => "w:footerReference",
        }
    }

    /// Root element of the part.
    pub fn root_element(self) -> &'static str {
        match self {
            PartKind::Header => "w:hdr",
            PartKind::Footer => "w:ftr",
        }
    }

    /// File stem used for new part names.
    pub fn stem(self) -> &'static str {
        match self {
            PartKind::Header => "header",
            PartKind::Footer => "footer",
        }
    }
}

/// Relationship id of a header/footer reference in a section.
pub fn reference_id(sect: &XmlElement, part: PartKind, kind: HeaderFooterKind) -> Option<&str> {
    sect.elements()
        .find(|el| {
            el.name == part.reference_element() && el.attr("w:type") == Some(kind.as_ooxml())
        })
        .and_then(|el| el.attr("r:id"))
}

/// Point a section's header/footer reference at a relationship id.
pub fn set_reference(sect: &mut XmlElement, part: PartKind, kind: HeaderFooterKind, r_id: &str) {
    let element = part.reference_element();
    let existing = sect
        .elements_mut()
        .find(|el| el.name == element && el.attr("w:type") == Some(kind.as_ooxml()));
    match existing {
        Some(el) => el.set_attr("r:id", r_id),
        None => {
            sect.insert_ordered(
                XmlElement::new(element)
                    .with_attr("w:type", kind.as_ooxml())
                    .with_attr("r:id", r_id),
                SECT_PR_ORDER,
            );
        }
    }
}

/// Enable a distinct first-page header/footer.
pub fn set_title_page(sect: &mut XmlElement) {
    sect.ensure_child_ordered("w:titlePg", SECT_PR_ORDER);
}

/// Default US Letter section properties with one-inch margins.
pub fn default_section() -> XmlElement {
    XmlElement::new(SECT_PR)
        .with_child(
            XmlElement::new("w:pgSz")
                .with_attr("w:w", "12240")
                .with_attr("w:h", "15840"),
        )
        .with_child(
            XmlElement::new("w:pgMar")
                .with_attr("w:top", "1440")
                .with_attr("w:right", "1440")
                .with_attr("w:bottom", "1440")
                .with_attr("w:left", "1440")
                .with_attr("w:header", "720")
                .with_attr("w:footer", "720")
                .with_attr("w:gutter", "0"),
        )
        .with_child(XmlElement::new("w:cols").with_attr("w:space", "720"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reference_inserts_then_replaces() {
        let mut sect = default_section();
        set_reference(&mut sect, PartKind::Footer, HeaderFooterKind::Default, "rId7");
        assert_eq!(sect.elements().next().unwrap().name, "w:footerReference");
        assert_eq!(
            reference_id(&sect, PartKind::Footer, HeaderFooterKind::Default),
            Some("rId7")
        );

        set_reference(&mut sect, PartKind::Footer, HeaderFooterKind::Default, "rId9");
        assert_eq!(sect.find_all("w:footerReference").len(), 1);
        assert_eq!(
            reference_id(&sect, PartKind::Footer, HeaderFooterKind::Default),
            Some("rId9")
        );
        assert!(reference_id(&sect, PartKind::Header, HeaderFooterKind::Default).is_none());
    }

    #[test]
    fn test_title_page_position() {
        let mut sect = default_section();
        set_title_page(&mut sect);
        set_title_page(&mut sect);
        let names: Vec<&str> = sect.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:pgSz", "w:pgMar", "w:cols", "w:titlePg"]);
    }
}

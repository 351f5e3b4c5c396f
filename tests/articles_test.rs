//! Integration tests for locating, removing and appending articles.

use journal_updater::journal::{
    append_article, append_articles, clear_articles, clear_articles_preserve_editorials,
    default_editorial_headings, delete_after_page, discover_article_files, find_toc_titles,
    remove_pages_from, RemovalStrategy,
};
use journal_updater::model::paragraph::new_paragraph;
use journal_updater::model::{HeaderFooterKind, PartKind, XmlElement};
use journal_updater::package::{ContentTypes, REL_HYPERLINK, REL_IMAGE};
use journal_updater::{map_pages_to_paragraphs, Document};
use tempfile::TempDir;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn doc_with(paragraphs: &[&str]) -> Document {
    let mut doc = Document::new();
    for text in paragraphs {
        doc.add_paragraph(text);
    }
    doc
}

fn with_image(doc: &mut Document, bytes: &[u8]) -> String {
    doc.package_mut().set("word/media/image1.png", bytes.to_vec());
    let mut rels = doc.relationships().unwrap();
    let id = rels.add(REL_IMAGE, "media/image1.png", false);
    rels.store(doc.package_mut()).unwrap();
    id
}

fn picture_paragraph(rel_id: &str) -> XmlElement {
    XmlElement::new("w:p").with_child(
        XmlElement::new("w:r").with_child(
            XmlElement::new("w:drawing").with_child(XmlElement::new("a:blip").with_attr("r:embed", rel_id)),
        ),
    )
}

#[test]
fn test_page_buckets_from_one_break() {
    let mut doc = Document::new();
    let first = doc.add_paragraph("First page");
    doc.add_break_to(first);
    doc.add_paragraph("Second page");

    let pages = map_pages_to_paragraphs(&doc);
    assert_eq!(pages.page_count(), 2);
    assert_eq!(pages.paragraphs_on(1), &[0]);
    assert_eq!(pages.paragraphs_on(2), &[1]);
}

#[test]
fn test_toc_titles_and_removal() {
    let mut doc = doc_with(&[
        "Volume 1, Issue 1",
        "Table of Contents",
        "ARTICLES",
        "Caring at Home..........4",
        "Nurses' Voices\t9",
        "",
        "Editorial",
        "ARTICLES",
        "Caring at Home",
        "text one",
        "Nurses' Voices",
        "text two",
    ]);
    assert_eq!(find_toc_titles(&doc), vec!["Caring at Home", "Nurses' Voices"]);

    let removal = clear_articles(&mut doc);
    assert_eq!(removal.strategy, RemovalStrategy::TableOfContents);
    assert_eq!(removal.start, Some(7));
    assert_eq!(doc.paragraph_texts().last().unwrap(), "Editorial");
}

#[test]
fn test_preserve_editorials_keeps_last_editorial_page() {
    let mut doc = Document::new();
    doc.add_paragraph("Guest Editorial");
    doc.add_paragraph("ARTICLES");
    let last = doc.add_paragraph("Editorial text");
    doc.add_break_to(last);
    doc.add_paragraph("ARTICLES");
    doc.add_paragraph("Old article");

    let removal = clear_articles_preserve_editorials(&mut doc, &default_editorial_headings());
    assert_eq!(removal.start, Some(3));
    assert_eq!(
        doc.paragraph_texts(),
        vec!["Guest Editorial", "ARTICLES", "Editorial text"]
    );
}

#[test]
fn test_remove_pages_from_missing_page_is_noop() {
    let mut doc = doc_with(&["Only page"]);
    assert_eq!(remove_pages_from(&mut doc, 2), None);
    assert_eq!(doc.block_count(), 1);
}

#[test]
fn test_delete_after_page() {
    let mut doc = Document::new();
    let first = doc.add_paragraph("Keep this");
    doc.add_break_to(first);
    doc.add_paragraph("Remove");

    delete_after_page(&mut doc, 1);
    assert_eq!(doc.paragraph_texts(), vec!["Keep this"]);
}

#[test]
fn test_discover_sorts_case_insensitively() {
    let dir = TempDir::new().unwrap();
    for name in ["b_article.docx", "article10.docx", "Article2.docx", "article1.DOCX", "article3.txt"] {
        doc_with(&[name]).save(dir.path().join(name)).unwrap();
    }
    let names: Vec<String> = discover_article_files(dir.path())
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["article1.DOCX", "article10.docx", "Article2.docx"]);
}

#[test]
fn test_append_discovered_articles_in_name_order() {
    let dir = TempDir::new().unwrap();
    // Written in reverse order with mixed case.
    doc_with(&["From B"]).save(dir.path().join("Article_B.docx")).unwrap();
    doc_with(&["From a"]).save(dir.path().join("article_a.docx")).unwrap();

    let files = discover_article_files(dir.path());
    let mut doc = doc_with(&["Base"]);
    let appended = append_articles(&mut doc, &files);
    assert_eq!(
        appended,
        vec![dir.path().join("article_a.docx"), dir.path().join("Article_B.docx")]
    );
    assert_eq!(doc.paragraph_texts(), vec!["Base", "From a", "From B"]);
}

#[test]
fn test_append_articles_keeps_explicit_order() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.docx");
    let b = dir.path().join("b.docx");
    doc_with(&["From a"]).save(&a).unwrap();
    doc_with(&["From b"]).save(&b).unwrap();

    let mut doc = doc_with(&["Base"]);
    let appended = append_articles(&mut doc, &[b.clone(), a.clone()]);
    assert_eq!(appended, vec![b, a]);
    assert_eq!(doc.paragraph_texts(), vec!["Base", "From b", "From a"]);
}

#[test]
fn test_append_article_drops_section_header_links() {
    let mut base = doc_with(&["Base"]);
    base.add_header_footer(0, PartKind::Footer, HeaderFooterKind::Default, vec![new_paragraph("Issue footer")])
        .unwrap();

    let mut article = doc_with(&["Article"]);
    article
        .add_header_footer(0, PartKind::Header, HeaderFooterKind::Default, vec![new_paragraph("Article header")])
        .unwrap();
    let header_id = article.sections()[0]
        .child("w:headerReference")
        .unwrap()
        .attr("r:id")
        .unwrap()
        .to_string();
    let section_break = XmlElement::new("w:sectPr")
        .with_child(
            XmlElement::new("w:headerReference")
                .with_attr("w:type", "default")
                .with_attr("r:id", header_id.as_str()),
        )
        .with_child(XmlElement::new("w:type").with_attr("w:val", "nextPage"));
    article.append_block(
        XmlElement::new("w:p").with_child(XmlElement::new("w:pPr").with_child(section_break)),
    );
    article.append_block(
        XmlElement::new("w:p").with_child(XmlElement::new("w:hyperlink").with_attr("r:id", "rId99")),
    );

    append_article(&mut base, article).unwrap();
    let base = Document::from_bytes(&base.to_bytes().unwrap()).unwrap();

    let moved = base.block(2).unwrap();
    let sect = moved.child("w:pPr").unwrap().child("w:sectPr").unwrap();
    assert!(!sect.has_child("w:headerReference"));
    assert!(sect.has_child("w:type"));
    assert!(base.body().find_all("w:headerReference").is_empty());
    assert_eq!(base.body().find_all("w:footerReference").len(), 1);

    let link = base.block(3).unwrap().child("w:hyperlink").unwrap();
    assert_eq!(link.attr("r:id"), None);
}

#[test]
fn test_append_article_copies_images_and_links() {
    let mut base = doc_with(&["Base"]);
    let base_id = with_image(&mut base, b"base-image");
    base.append_block(picture_paragraph(&base_id));

    let mut article = doc_with(&["Article"]);
    let image_id = with_image(&mut article, PNG);
    article.append_block(picture_paragraph(&image_id));
    let link_id = {
        let mut rels = article.relationships().unwrap();
        let id = rels.add(REL_HYPERLINK, "https://example.org/paper", true);
        rels.store(article.package_mut()).unwrap();
        id
    };
    article.append_block(
        XmlElement::new("w:p").with_child(XmlElement::new("w:hyperlink").with_attr("r:id", link_id.as_str())),
    );

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("article.docx");
    article.save(&path).unwrap();
    let article = Document::open(&path).unwrap();

    append_article(&mut base, article).unwrap();

    let blips: Vec<String> = base
        .body()
        .find_all("a:blip")
        .iter()
        .filter_map(|b| b.attr("r:embed").map(str::to_string))
        .collect();
    assert_eq!(blips.len(), 2);
    assert_eq!(blips[0], base_id);
    assert_ne!(blips[1], base_id);

    let rels = base.relationships().unwrap();
    let part = rels.part_name(&blips[1]).unwrap();
    assert_eq!(part, "word/media/image2.png");
    assert_eq!(base.package().get(&part), Some(PNG));
    assert_eq!(base.package().get("word/media/image1.png"), Some(&b"base-image"[..]));

    let link = base.body().find_all("w:hyperlink")[0].attr("r:id").unwrap().to_string();
    let rel = rels.get(&link).unwrap();
    assert!(rel.external);
    assert_eq!(rel.target, "https://example.org/paper");

    let types = ContentTypes::load(base.package()).unwrap();
    assert!(types.has_default("png"));
}

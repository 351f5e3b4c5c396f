//! Integration tests for the end-to-end issue update.

use std::path::{Path, PathBuf};

use journal_updater::journal::{RemovalStrategy, INSTRUCTIONS_FILE, PRESIDENT_MESSAGE_FILE};
use journal_updater::model::paragraph::run_font_size;
use journal_updater::model::table::{cell_text, is_autofit, set_autofit, set_cell_text};
use journal_updater::{update_journal, Document, ExportOutcome, UpdateOptions};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    content: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        std::fs::create_dir(&content).unwrap();
        Self { dir, content }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn article(&self, name: &str, paragraphs: &[&str]) {
        save(&self.content.join(name), paragraphs);
    }

    fn instructions(&self, json: &str) {
        std::fs::write(self.content.join(INSTRUCTIONS_FILE), json).unwrap();
    }
}

fn save(path: &Path, paragraphs: &[&str]) {
    let mut doc = Document::new();
    for text in paragraphs {
        doc.add_paragraph(text);
    }
    doc.save(path).unwrap();
}

fn options() -> UpdateOptions {
    UpdateOptions::new()
        .with_issue("2", "3")
        .with_month_year("July 2025")
        .with_pdf_export(false)
}

fn old_journal() -> Vec<&'static str> {
    vec![
        "Volume 1, Issue 1",
        "Old date line",
        "Table of Contents",
        "ARTICLES",
        "Old Article................1",
        "OTHER",
        "ARTICLES",
        "Old Article",
        "Old article text",
    ]
}

#[test]
fn test_update_with_table_of_contents() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(&base, &old_journal());
    ws.article("article1.docx", &["New Article Body"]);
    let out = ws.path("out.docx");

    let report = update_journal(&base, &ws.content, &out, &options()).unwrap();
    assert_eq!(report.removal.strategy, RemovalStrategy::TableOfContents);
    assert_eq!(report.removal.start, Some(6));
    assert_eq!(report.insertion_index, 6);

    let texts = Document::open(&out).unwrap().paragraph_texts();
    assert!(texts[0].contains("Volume 2, Issue 3"));
    assert!(texts[0].contains("July 2025"));
    assert!(texts.contains(&"New Article Body".to_string()));
    assert!(!texts.contains(&"Old Article".to_string()));
    assert!(!texts.contains(&"Old article text".to_string()));
}

#[test]
fn test_instructions_override_volume_and_missing_start_page() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(&base, &old_journal());
    ws.article("article1.docx", &["New Article Body"]);
    ws.instructions(r#"{"volume": "4", "issue": "6"}"#);
    let out = ws.path("out.docx");

    let opts = UpdateOptions::new()
        .with_issue("1", "2")
        .with_month_year("July 2025")
        .with_start_page(3)
        .with_pdf_export(false);
    let report = update_journal(&base, &ws.content, &out, &opts).unwrap();
    assert_eq!(report.volume, "4");
    assert_eq!(report.issue, "6");
    assert_ne!(report.removal.strategy, RemovalStrategy::StartPage(3));

    let texts = Document::open(&out).unwrap().paragraph_texts();
    assert!(texts[0].contains("Volume 4, Issue 6"));
    assert!(texts.contains(&"New Article Body".to_string()));
    assert!(!texts.contains(&"Old Article".to_string()));
}

#[test]
fn test_start_page_removal() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    let mut doc = Document::new();
    doc.add_paragraph("Volume 1, Issue 1");
    doc.add_page_break();
    doc.add_paragraph("Editorial board");
    doc.add_page_break();
    doc.add_paragraph("Old article on page 3");
    doc.save(&base).unwrap();
    ws.article("article1.docx", &["Fresh"]);
    let out = ws.path("out.docx");

    let report =
        update_journal(&base, &ws.content, &out, &options().with_start_page(3)).unwrap();
    assert_eq!(report.removal.strategy, RemovalStrategy::StartPage(3));
    assert_eq!(report.removal.start, Some(4));

    let texts = Document::open(&out).unwrap().paragraph_texts();
    assert!(texts.contains(&"Editorial board".to_string()));
    assert!(!texts.contains(&"Old article on page 3".to_string()));
    assert_eq!(texts.last().unwrap(), "Fresh");
}

#[test]
fn test_preserve_editorial_sections() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(
        &base,
        &[
            "President's Message",
            "Old message",
            "First Editorial",
            "Old first text",
            "Second Editorial",
            "Old second text",
            "ARTICLES",
            "Old article",
        ],
    );
    ws.article("article1.docx", &["New article text"]);
    std::fs::write(ws.content.join(PRESIDENT_MESSAGE_FILE), "Welcome to the new issue.\n").unwrap();
    let out = ws.path("out.docx");

    let report = update_journal(&base, &ws.content, &out, &options()).unwrap();
    assert_eq!(report.removal.strategy, RemovalStrategy::PreserveEditorials);

    let texts = Document::open(&out).unwrap().paragraph_texts();
    for kept in ["President's Message", "First Editorial", "Second Editorial"] {
        assert!(texts.contains(&kept.to_string()), "missing {}", kept);
    }
    assert_eq!(texts[1], "Welcome to the new issue.");
    assert!(!texts.contains(&"Old article".to_string()));
    assert!(texts.contains(&"New article text".to_string()));
}

#[test]
fn test_discovered_articles_in_name_order() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(&base, &["ARTICLES"]);
    ws.article("article2.DOCX", &["Second article"]);
    ws.article("Article1.docx", &["First article"]);
    ws.article("notes.docx", &["Not an article"]);
    let out = ws.path("out.docx");

    let report = update_journal(&base, &ws.content, &out, &options()).unwrap();
    assert_eq!(report.articles_appended.len(), 2);

    let texts = Document::open(&out).unwrap().paragraph_texts();
    assert_eq!(texts, vec!["First article", "Second article"]);
}

#[test]
fn test_unreadable_article_is_skipped() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(&base, &["ARTICLES"]);
    std::fs::write(ws.content.join("article1.docx"), b"not a zip").unwrap();
    ws.article("article2.docx", &["Good article"]);
    let out = ws.path("out.docx");

    let report = update_journal(&base, &ws.content, &out, &options()).unwrap();
    assert_eq!(report.articles_appended, vec![ws.content.join("article2.docx")]);
    assert_eq!(
        Document::open(&out).unwrap().paragraph_texts(),
        vec!["Good article"]
    );
}

#[test]
fn test_font_size_applies_to_new_articles_only() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(&base, &["Volume 1, Issue 1", "Keep me", "ARTICLES", "Old"]);
    ws.article("article1.docx", &["New one", "New two"]);
    ws.instructions(r#"{"font_size": 14}"#);
    let out = ws.path("out.docx");

    let report = update_journal(&base, &ws.content, &out, &options()).unwrap();
    assert_eq!(report.insertion_index, 2);

    let doc = Document::open(&out).unwrap();
    for index in 0..doc.block_count() {
        let run = doc.block(index).unwrap().child("w:r").unwrap();
        let expected = if index >= 2 { Some(14.0) } else { None };
        assert_eq!(run_font_size(run), expected, "block {}", index);
    }
}

#[test]
fn test_autofit_instruction() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    let mut doc = Document::new();
    doc.add_paragraph("Volume 1, Issue 1");
    let intro = doc.add_paragraph("intro");
    doc.add_break_to(intro);
    let table = doc.add_table(1, 2);
    {
        let tbl = doc.block_mut(table).unwrap();
        set_cell_text(tbl, 0, 0, "target");
        set_autofit(tbl, false);
    }
    doc.add_paragraph("ARTICLES");
    doc.save(&base).unwrap();
    ws.instructions(r#"{"autofit_table_on_page": 2}"#);
    let out = ws.path("out.docx");

    update_journal(
        &base,
        &ws.content,
        &out,
        &options().with_article_files(Vec::new()),
    )
    .unwrap();

    let result = Document::open(&out).unwrap();
    let target = result
        .tables()
        .into_iter()
        .find(|t| cell_text(t, 0, 0).as_deref() == Some("target"))
        .unwrap();
    assert!(is_autofit(target));
}

#[test]
fn test_cleanup_instructions_and_finishing_passes() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(&base, &["Volume 1, Issue 1", "ARTICLES"]);

    let mut article = Document::new();
    let first = article.add_paragraph("nurses  voices matter");
    article.add_break_to(first);
    article.add_paragraph("Page two");
    article.add_page_break();
    article.add_paragraph("Page three");
    article.save(ws.content.join("article1.docx")).unwrap();

    ws.instructions(
        r#"{
            "delete_after_page": 2,
            "page_borders": {"center_line": true},
            "columns": 2,
            "finishing_passes": [
                {"pass": "remove_extra_spaces", "page": 1},
                {"pass": "fix_apostrophe", "page": 1, "params": {"word": "nurses voices", "corrected": "nurses' voices"}},
                {"pass": "not_implemented_yet"}
            ]
        }"#,
    );
    let out = ws.path("out.docx");

    let report = update_journal(&base, &ws.content, &out, &options()).unwrap();
    assert_eq!(report.passes_run, 2);

    let doc = Document::open(&out).unwrap();
    let texts = doc.paragraph_texts();
    assert!(texts.contains(&"nurses' voices matter".to_string()));
    assert!(texts.contains(&"Page two".to_string()));
    assert!(!texts.contains(&"Page three".to_string()));

    let sect = doc.sections()[0];
    assert_eq!(sect.child("w:cols").unwrap().attr("w:num"), Some("2"));
    assert_eq!(sect.find_all("w:pgBorders").len(), 1);
}

#[test]
fn test_export_outcome_recorded() {
    let ws = Workspace::new();
    let base = ws.path("base.docx");
    save(&base, &["ARTICLES"]);
    let out = ws.path("out.docx");

    let report = update_journal(&base, &ws.content, &out, &options()).unwrap();
    assert_eq!(report.export, ExportOutcome::Skipped);
    assert!(out.exists());
}

//! End-to-end issue update.

use super::articles::{
    append_articles, clear_articles_preserve_editorials, delete_after_last_editorial_page,
    delete_after_page, discover_article_files, remove_pages_from, Removal, RemovalStrategy,
};
use super::finishing::PassRegistry;
use super::format::{
    add_page_borders_with_rule, apply_font, apply_line_spacing, autofit_first_table,
    cleanup_horizontal_lines, install_footer_table, set_columns,
};
use super::instructions::Instructions;
use super::options::{UpdateOptions, UpdateReport};
use super::patch::{
    insert_presidents_message, remove_text_labels, update_assistant_editors,
    update_associate_editors, update_business_information, update_front_cover,
    update_page2_header, IssueInfo,
};
use crate::error::Result;
use crate::export::{export_pdf_best_effort, ExportOutcome, PdfExporter, SofficeExporter};
use crate::model::{Document, PageMap};
use log::{debug, info, warn};
use std::path::Path;

/// Optional president's message in the content directory.
pub const PRESIDENT_MESSAGE_FILE: &str = "president_message.txt";

/// Update `base` with the articles in `content_dir` and save to `output`.
///
/// The PDF, when requested, is produced with [`SofficeExporter`].
pub fn update_journal(
    base: &Path,
    content_dir: &Path,
    output: &Path,
    options: &UpdateOptions,
) -> Result<UpdateReport> {
    update_journal_with(base, content_dir, output, options, &SofficeExporter::new())
}

/// Same as [`update_journal`] with a caller-supplied PDF exporter.
///
/// Only loading `base` and saving `output` can fail; every other step logs
/// and carries on.
pub fn update_journal_with(
    base: &Path,
    content_dir: &Path,
    output: &Path,
    options: &UpdateOptions,
    exporter: &dyn PdfExporter,
) -> Result<UpdateReport> {
    let instructions = Instructions::load(content_dir);
    let issue = resolve_issue(&options.issue, &instructions);
    let formatted = instructions
        .format_front_and_footer
        .unwrap_or(options.format_front_and_footer);
    info!("Updating {} as {}", base.display(), issue.label());

    let mut doc = Document::open(base)?;

    if !update_front_cover(&mut doc, &issue, options.cover_page_num, formatted) {
        debug!("Front cover block not found");
    }
    if formatted {
        if let Err(e) = install_footer_table(&mut doc, 0, &options.footer_label, &issue.label()) {
            warn!("Footer layout skipped: {}", e);
        }
    }

    if let Some(business) = &options.business {
        update_business_information(&mut doc, &business.old_year, &business.new_beginning);
    }

    let header_options = UpdateOptions {
        issue: issue.clone(),
        ..options.clone()
    };
    if let Err(e) = update_page2_header(
        &mut doc,
        &header_options.resolved_header_text(),
        options.header_page_num,
    ) {
        warn!("Header update skipped: {}", e);
    }

    if let Some(editor) = &options.associate_editor {
        update_associate_editors(
            &mut doc,
            &editor.remove_name,
            &editor.name,
            &editor.affiliation,
            &editor.email,
        );
    }
    for name in &options.assistant_editor_removals {
        update_assistant_editors(&mut doc, name);
    }
    if !options.text_labels.is_empty() {
        remove_text_labels(&mut doc, &options.text_labels);
    }

    let message = read_president_message(content_dir);
    insert_presidents_message(&mut doc, message.as_deref());

    let removal = remove_old_articles(&mut doc, options);
    let insertion_index = doc.block_count();
    info!(
        "Removed {} blocks ({:?}); new articles start at block {}",
        removal.removed, removal.strategy, insertion_index
    );

    let files = match &options.article_files {
        Some(files) => files.clone(),
        None => discover_article_files(content_dir),
    };
    if files.is_empty() {
        warn!("No articles found in {}", content_dir.display());
    }
    let articles_appended = append_articles(&mut doc, &files);

    apply_formatting(&mut doc, &instructions, insertion_index);
    let passes_run = apply_cleanup(&mut doc, &instructions, options);

    doc.save(output)?;
    info!("Saved {}", output.display());

    let export = if options.export_pdf {
        export_pdf_best_effort(exporter, output)
    } else {
        ExportOutcome::Skipped
    };

    Ok(UpdateReport {
        output: output.to_path_buf(),
        volume: issue.volume,
        issue: issue.issue,
        removal,
        insertion_index,
        articles_appended,
        passes_run,
        export,
    })
}

fn resolve_issue(issue: &IssueInfo, instructions: &Instructions) -> IssueInfo {
    let mut resolved = issue.clone();
    if let Some(volume) = &instructions.volume {
        debug!("Volume overridden to {}", volume);
        resolved.volume = volume.clone();
    }
    if let Some(number) = &instructions.issue {
        debug!("Issue overridden to {}", number);
        resolved.issue = number.clone();
    }
    resolved
}

fn read_president_message(content_dir: &Path) -> Option<String> {
    let path = content_dir.join(PRESIDENT_MESSAGE_FILE);
    match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("No president's message at {}: {}", path.display(), e);
            None
        }
    }
}

fn remove_old_articles(doc: &mut Document, options: &UpdateOptions) -> Removal {
    if let Some(page) = options.start_page {
        let before = doc.block_count();
        match remove_pages_from(doc, page) {
            Some(start) => {
                return Removal {
                    strategy: RemovalStrategy::StartPage(page),
                    start: Some(start),
                    removed: before - doc.block_count(),
                };
            }
            None => warn!("Start page {} not found, locating articles instead", page),
        }
    }
    clear_articles_preserve_editorials(doc, &options.editorial_headings)
}

fn start_of(doc: &Document, page: Option<u32>, fallback: usize) -> Option<usize> {
    match page {
        Some(page) => {
            let start = PageMap::from_blocks(&doc.snapshot()).first_block_of(page);
            if start.is_none() {
                warn!("Page {} not found, formatting skipped", page);
            }
            start
        }
        None => Some(fallback),
    }
}

fn apply_formatting(doc: &mut Document, instructions: &Instructions, insertion: usize) {
    if instructions.font_size.is_some() || instructions.font_family.is_some() {
        if let Some(from) = start_of(doc, instructions.font_size_from_page, insertion) {
            let touched = apply_font(
                doc,
                from,
                instructions.font_size,
                instructions.font_family.as_deref(),
            );
            debug!("Font applied to {} blocks from {}", touched, from);
        }
    }
    if let Some(spacing) = instructions.line_spacing {
        if let Some(from) = start_of(doc, instructions.line_spacing_from_page, insertion) {
            let touched = apply_line_spacing(doc, from, spacing);
            debug!("Line spacing applied to {} blocks from {}", touched, from);
        }
    }
}

fn apply_cleanup(doc: &mut Document, instructions: &Instructions, options: &UpdateOptions) -> usize {
    if let Some(page) = instructions.delete_after_page {
        let removed = delete_after_page(doc, page);
        info!("Deleted {} blocks after page {}", removed, page);
    }
    if instructions.delete_after_editorial {
        let removed = delete_after_last_editorial_page(doc, &options.editorial_headings);
        info!("Deleted {} blocks after the last editorial page", removed);
    }
    if instructions.cleanup_black_lines {
        cleanup_horizontal_lines(doc);
    }
    if let Some(page) = instructions.autofit_table_on_page {
        if !autofit_first_table(doc, page) {
            debug!("No table autofitted on page {}", page);
        }
    }
    if let Some(columns) = &instructions.columns {
        if let Err(e) = set_columns(doc, columns.section(), columns.count(), columns.spacing()) {
            warn!("Columns skipped: {}", e);
        }
    }
    if let Some(borders) = instructions.page_borders.as_ref().filter(|b| b.enabled()) {
        if let Err(e) = add_page_borders_with_rule(doc, borders.section(), borders.center_line()) {
            warn!("Page borders skipped: {}", e);
        }
    }
    if instructions.finishing_passes.is_empty() {
        return 0;
    }
    PassRegistry::with_defaults().run_all(doc, &instructions.finishing_passes)
}

//! Removing old article content and appending new articles.

use super::patch::COVER_LANDMARK;
use super::text::{eq_fold, fold};
use super::toc::{scan_toc, TocScan};
use crate::error::Result;
use crate::model::{BlockSnapshot, Document, PageMap, XmlElement};
use crate::package::{
    image_content_type, relative_target, resolve_target, ContentTypes, Relationships, REL_IMAGE,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Headings that mark editorial content when no custom list is given.
pub const DEFAULT_EDITORIAL_HEADINGS: &[&str] = &[
    "President's Message",
    "Editorial",
    "Guest Editorial",
    "From the Editor",
    "Editor's Note",
];

/// Attributes that carry relationship ids inside body content.
const REL_ATTRS: &[&str] = &["r:embed", "r:id", "r:link", "r:pict"];

/// How old article content was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "page")]
pub enum RemovalStrategy {
    /// Everything from an explicit start page
    StartPage(u32),
    /// From the ARTICLES heading after the last editorial marker
    PreserveEditorials,
    /// From the earliest body heading matching a TOC title
    TableOfContents,
    /// From the first paragraph mentioning ARTICLES
    ArticlesHeading,
    /// No landmark found, nothing removed
    NotFound,
}

/// Outcome of an article removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Removal {
    /// Strategy that determined the range
    pub strategy: RemovalStrategy,

    /// Block index where removal started (new content goes here)
    pub start: Option<usize>,

    /// Number of blocks removed
    pub removed: usize,
}

impl Removal {
    fn not_found() -> Self {
        Self {
            strategy: RemovalStrategy::NotFound,
            start: None,
            removed: 0,
        }
    }
}

/// Check whether a paragraph is an editorial marker.
///
/// Matches a configured heading (normalized, case-insensitive) or any text
/// containing "editorial".
pub fn is_editorial_marker(text: &str, headings: &[String]) -> bool {
    let folded = fold(text);
    if folded.is_empty() {
        return false;
    }
    folded.contains("editorial") || headings.iter().any(|h| fold(h) == folded)
}

/// Default editorial headings as owned strings.
pub fn default_editorial_headings() -> Vec<String> {
    DEFAULT_EDITORIAL_HEADINGS.iter().map(|h| h.to_string()).collect()
}

/// Plan the removal boundaries from TOC titles.
///
/// Returns the sorted block indices of matched body headings, with the
/// first moved onto a directly preceding "ARTICLES" paragraph.
fn title_boundaries(snapshot: &[BlockSnapshot], toc: &TocScan) -> Vec<usize> {
    let mut positions: Vec<usize> = Vec::new();
    for title in &toc.titles {
        let wanted = fold(title);
        let found = snapshot.iter().find(|b| {
            b.is_paragraph()
                && !toc.covers(b.index)
                && !positions.contains(&b.index)
                && fold(&b.text) == wanted
        });
        match found {
            Some(block) => positions.push(block.index),
            None => debug!("TOC title {:?} has no body heading", title),
        }
    }
    positions.sort_unstable();
    positions.dedup();

    if let Some(first) = positions.first_mut() {
        if *first > 0 {
            let prev = &snapshot[*first - 1];
            if prev.is_paragraph() && eq_fold(&prev.text, "ARTICLES") {
                *first -= 1;
            }
        }
    }
    positions
}

/// Remove old articles using the table of contents.
///
/// Falls back to deleting from the first paragraph containing "ARTICLES"
/// (any case) when the TOC yields no matched titles. The front-cover block
/// is never taken as that paragraph.
pub fn clear_articles(doc: &mut Document) -> Removal {
    let snapshot = doc.snapshot();
    let toc = scan_toc(&snapshot);
    let boundaries = title_boundaries(&snapshot, &toc);

    if let Some(&start) = boundaries.first() {
        let mut removed = 0;
        let mut end = snapshot.len();
        for &boundary in boundaries.iter().rev() {
            removed += doc.remove_blocks(boundary..end);
            end = boundary;
        }
        info!(
            "Removed {} blocks for {} TOC titles from block {}",
            removed,
            boundaries.len(),
            start
        );
        return Removal {
            strategy: RemovalStrategy::TableOfContents,
            start: Some(start),
            removed,
        };
    }

    // The rewritten cover block may carry a section title like "Update Articles".
    let heading = snapshot.iter().find(|b| {
        b.is_paragraph()
            && !b.text.contains(COVER_LANDMARK)
            && b.text.to_uppercase().contains("ARTICLES")
    });
    match heading {
        Some(block) => {
            let removed = doc.truncate_blocks(block.index);
            info!("Removed {} blocks from ARTICLES heading at {}", removed, block.index);
            Removal {
                strategy: RemovalStrategy::ArticlesHeading,
                start: Some(block.index),
                removed,
            }
        }
        None => {
            debug!("No ARTICLES landmark, nothing removed");
            Removal::not_found()
        }
    }
}

/// Remove old articles while keeping every editorial section.
///
/// Deletion starts at the first exact "ARTICLES" paragraph after the last
/// editorial marker. Without markers this is [`clear_articles`].
pub fn clear_articles_preserve_editorials(doc: &mut Document, headings: &[String]) -> Removal {
    let snapshot = doc.snapshot();
    let pages = PageMap::from_blocks(&snapshot);

    let mut last_marker: Option<(u32, usize)> = None;
    for (page, blocks) in pages.pages() {
        for &index in blocks {
            let block = &snapshot[index];
            if block.is_paragraph() && is_editorial_marker(&block.text, headings) {
                last_marker = Some((page, index));
            }
        }
    }

    let Some((last_page, marker)) = last_marker else {
        debug!("No editorial markers, clearing by table of contents");
        return clear_articles(doc);
    };
    debug!("Last editorial marker at block {} on page {}", marker, last_page);

    let start = (last_page..=pages.last_page())
        .flat_map(|page| pages.paragraphs_on(page).iter().copied())
        .find(|&index| index > marker && eq_fold(&snapshot[index].text, "ARTICLES"));

    match start {
        Some(start) => {
            let removed = doc.truncate_blocks(start);
            info!("Removed {} blocks after editorials from block {}", removed, start);
            Removal {
                strategy: RemovalStrategy::PreserveEditorials,
                start: Some(start),
                removed,
            }
        }
        None => {
            debug!("No ARTICLES heading after the last editorial, nothing removed");
            Removal {
                strategy: RemovalStrategy::PreserveEditorials,
                start: None,
                removed: 0,
            }
        }
    }
}

/// Delete everything from the first block of `page` to the end.
///
/// Returns the insertion index, or `None` (document untouched) when the
/// page does not exist or is empty.
pub fn remove_pages_from(doc: &mut Document, page: u32) -> Option<usize> {
    let start = PageMap::from_blocks(&doc.snapshot()).first_block_of(page)?;
    let removed = doc.truncate_blocks(start);
    debug!("Removed {} blocks from page {}", removed, page);
    Some(start)
}

/// Keep pages `1..=page` and delete everything after.
pub fn delete_after_page(doc: &mut Document, page: u32) -> usize {
    let before = doc.block_count();
    match remove_pages_from(doc, page.saturating_add(1)) {
        Some(_) => before - doc.block_count(),
        None => 0,
    }
}

/// Delete everything after the last page holding an editorial marker.
pub fn delete_after_last_editorial_page(doc: &mut Document, headings: &[String]) -> usize {
    let snapshot = doc.snapshot();
    let pages = PageMap::from_blocks(&snapshot);
    let last_page = pages
        .pages()
        .filter(|(_, blocks)| {
            blocks.iter().any(|&index| {
                let block = &snapshot[index];
                block.is_paragraph() && is_editorial_marker(&block.text, headings)
            })
        })
        .map(|(page, _)| page)
        .last();

    match last_page {
        Some(page) => delete_after_page(doc, page),
        None => {
            debug!("No editorial page found, nothing deleted");
            0
        }
    }
}

/// Find `article*.docx` files in a directory, sorted by name (case-insensitive).
pub fn discover_article_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read content directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_lowercase();
            (name.starts_with("article") && name.ends_with(".docx")).then_some((name, path))
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files.into_iter().map(|(_, path)| path).collect()
}

/// Copies relationship targets of moved content into the receiving package.
struct RelationshipRemapper<'a> {
    source: &'a Document,
    source_rels: Relationships,
    target: &'a mut Document,
    target_rels: Relationships,
    types: ContentTypes,
    mapped: HashMap<String, String>,
}

impl<'a> RelationshipRemapper<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Result<Self> {
        Ok(Self {
            source_rels: source.relationships()?,
            target_rels: target.relationships()?,
            types: ContentTypes::load(target.package())?,
            source,
            target,
            mapped: HashMap::new(),
        })
    }

    fn remap(&mut self, el: &mut XmlElement) {
        if el.is("w:sectPr") {
            // Article sections inherit the issue's headers and footers.
            el.remove_children("w:headerReference");
            el.remove_children("w:footerReference");
        }

        let mut unresolved = Vec::new();
        for (key, value) in el.attributes.iter_mut() {
            if REL_ATTRS.contains(&key.as_str()) {
                match self.resolve(value) {
                    Some(new_id) => *value = new_id,
                    None => unresolved.push(key.clone()),
                }
            }
        }
        for key in unresolved {
            debug!("Dropping unresolved {} on {}", key, el.name);
            el.remove_attr(&key);
        }

        for child in el.elements_mut() {
            self.remap(child);
        }
    }

    fn resolve(&mut self, id: &str) -> Option<String> {
        if let Some(new_id) = self.mapped.get(id) {
            return Some(new_id.clone());
        }
        let Some(rel) = self.source_rels.get(id) else {
            debug!("Relationship {} not found in article", id);
            return None;
        };

        let new_id = if rel.external {
            self.target_rels.add(&rel.rel_type, &rel.target, true)
        } else if rel.rel_type == REL_IMAGE {
            let part = resolve_target(self.source.main_part(), &rel.target);
            let Some(data) = self.source.package().get(&part) else {
                warn!("Image part {} missing from article", part);
                return None;
            };
            let ext = part.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin").to_lowercase();
            let name = self.target.package().unique_name("word/media", "image", &ext);
            self.target.package_mut().set(name.as_str(), data.to_vec());
            self.types.ensure_default(&ext, image_content_type(&ext));
            let target = relative_target(self.target.main_part(), &name);
            self.target_rels.add(REL_IMAGE, &target, false)
        } else {
            debug!("Relationship {} of type {} not carried over", id, rel.rel_type);
            return None;
        };

        self.mapped.insert(id.to_string(), new_id.clone());
        Some(new_id)
    }

    fn finish(self) -> Result<()> {
        self.target_rels.store(self.target.package_mut())?;
        self.types.store(self.target.package_mut())?;
        Ok(())
    }
}

/// Copy namespace declarations the article uses onto the target root.
fn merge_namespaces(target: &mut XmlElement, source: &XmlElement) {
    for (key, value) in &source.attributes {
        if key.starts_with("xmlns:") && target.attr(key).is_none() {
            target.set_attr(key.as_str(), value.as_str());
        }
    }

    let Some(ignorable) = source.attr("mc:Ignorable") else {
        return;
    };
    let mut tokens: Vec<String> = target
        .attr("mc:Ignorable")
        .map(|existing| existing.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    for token in ignorable.split_whitespace() {
        let declared = target.attr(&format!("xmlns:{}", token)).is_some();
        if declared && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    if !tokens.is_empty() {
        target.set_attr("mc:Ignorable", tokens.join(" "));
    }
}

/// Move every body block of `article` to the end of `doc`.
///
/// Blocks keep their run formatting; the article's headers and footers are
/// not carried over and moved section breaks lose their header and footer
/// references. Images and hyperlinks get fresh relationships in the target;
/// any other relationship id is dropped rather than left pointing into the
/// issue's package. Returns the number of blocks moved.
pub fn append_article(doc: &mut Document, mut article: Document) -> Result<usize> {
    merge_namespaces(doc.root_mut(), article.root());

    let mut blocks = article.take_blocks();
    let mut remapper = RelationshipRemapper::new(&article, doc)?;
    for block in &mut blocks {
        remapper.remap(block);
    }
    remapper.finish()?;

    let count = blocks.len();
    for block in blocks {
        doc.append_block(block);
    }
    Ok(count)
}

/// Open and append each article in order; unreadable articles are skipped.
///
/// Returns the paths that were appended.
pub fn append_articles(doc: &mut Document, files: &[PathBuf]) -> Vec<PathBuf> {
    let mut appended = Vec::new();
    for path in files {
        let article = match Document::open(path) {
            Ok(article) => article,
            Err(e) => {
                warn!("Skipping article {}: {}", path.display(), e);
                continue;
            }
        };
        match append_article(doc, article) {
            Ok(count) => {
                info!("Appended {} blocks from {}", count, path.display());
                appended.push(path.clone());
            }
            Err(e) => warn!("Skipping article {}: {}", path.display(), e),
        }
    }
    appended
}

//! Page mapping from manual page breaks.
//!
//! Real pagination depends on layout, which this crate never computes.
//! Pages are counted from explicit `w:br w:type="page"` markers only, so
//! the mapping is an approximation that is exact for documents whose page
//! boundaries are all manual. A mapping describes one snapshot of the body
//! and must be rebuilt after any block is inserted or removed.

use super::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of body-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// `w:p`
    Paragraph,
    /// `w:tbl`
    Table,
    /// Anything else (`w:sdt`, bookmarks, ...)
    Other,
}

/// Immutable view of one body block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    /// Index among body blocks
    pub index: usize,

    /// Block kind
    pub kind: BlockKind,

    /// Plain text (empty for non-paragraph blocks)
    pub text: String,

    /// Whether the block carries a manual page break
    pub page_break: bool,
}

impl BlockSnapshot {
    /// Check if this block is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        self.kind == BlockKind::Paragraph
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        self.kind == BlockKind::Table
    }
}

/// Mapping from 1-based page number to the blocks on that page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMap {
    blocks: BTreeMap<u32, Vec<usize>>,
    paragraphs: BTreeMap<u32, Vec<usize>>,
}

impl PageMap {
    /// Build a mapping from a block snapshot.
    ///
    /// A block carrying a page break belongs to the page it ends.
    pub fn from_blocks(snapshot: &[BlockSnapshot]) -> Self {
        let mut map = Self::default();
        map.blocks.insert(1, Vec::new());
        map.paragraphs.insert(1, Vec::new());

        let mut page = 1u32;
        for block in snapshot {
            map.blocks.entry(page).or_default().push(block.index);
            let paragraphs = map.paragraphs.entry(page).or_default();
            if block.is_paragraph() {
                paragraphs.push(block.index);
            }
            if block.page_break {
                page += 1;
            }
        }
        map
    }

    /// Number of page buckets.
    pub fn page_count(&self) -> usize {
        self.blocks.len()
    }

    /// Highest page number.
    pub fn last_page(&self) -> u32 {
        self.blocks.keys().next_back().copied().unwrap_or(1)
    }

    /// Check whether a page bucket exists.
    pub fn contains_page(&self, page: u32) -> bool {
        self.blocks.contains_key(&page)
    }

    /// Block indices on a page (empty if the page does not exist).
    pub fn blocks_on(&self, page: u32) -> &[usize] {
        self.blocks.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Paragraph block indices on a page.
    pub fn paragraphs_on(&self, page: u32) -> &[usize] {
        self.paragraphs.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First block of a page.
    pub fn first_block_of(&self, page: u32) -> Option<usize> {
        self.blocks_on(page).first().copied()
    }

    /// Page a block falls on.
    pub fn page_of(&self, block: usize) -> Option<u32> {
        self.blocks
            .iter()
            .find(|(_, blocks)| blocks.binary_search(&block).is_ok())
            .map(|(page, _)| *page)
    }

    /// Iterate over `(page, blocks)` in page order.
    pub fn pages(&self) -> impl Iterator<Item = (u32, &[usize])> {
        self.blocks.iter().map(|(page, blocks)| (*page, blocks.as_slice()))
    }
}

/// Map the current body of a document into page buckets.
pub fn map_pages_to_paragraphs(doc: &Document) -> PageMap {
    PageMap::from_blocks(&doc.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(index: usize, kind: BlockKind, page_break: bool) -> BlockSnapshot {
        BlockSnapshot {
            index,
            kind,
            text: String::new(),
            page_break,
        }
    }

    #[test]
    fn test_no_breaks_is_one_page() {
        let snapshot = vec![
            block(0, BlockKind::Paragraph, false),
            block(1, BlockKind::Table, false),
        ];
        let map = PageMap::from_blocks(&snapshot);
        assert_eq!(map.page_count(), 1);
        assert_eq!(map.blocks_on(1), &[0, 1]);
        assert_eq!(map.paragraphs_on(1), &[0]);
    }

    #[test]
    fn test_empty_document_still_has_page_one() {
        let map = PageMap::from_blocks(&[]);
        assert!(map.contains_page(1));
        assert_eq!(map.last_page(), 1);
        assert_eq!(map.first_block_of(1), None);
    }

    #[test]
    fn test_break_block_belongs_to_earlier_page() {
        let snapshot = vec![
            block(0, BlockKind::Paragraph, true),
            block(1, BlockKind::Paragraph, false),
            block(2, BlockKind::Table, false),
        ];
        let map = PageMap::from_blocks(&snapshot);
        assert_eq!(map.page_count(), 2);
        assert_eq!(map.blocks_on(1), &[0]);
        assert_eq!(map.blocks_on(2), &[1, 2]);
        assert_eq!(map.page_of(0), Some(1));
        assert_eq!(map.page_of(2), Some(2));
        assert_eq!(map.page_of(9), None);
        assert_eq!(map.first_block_of(2), Some(1));
    }

    #[test]
    fn test_trailing_break_opens_no_bucket() {
        let snapshot = vec![block(0, BlockKind::Paragraph, true)];
        let map = PageMap::from_blocks(&snapshot);
        assert_eq!(map.page_count(), 1);
        assert!(!map.contains_page(2));
        assert_eq!(map.first_block_of(2), None);
    }
}

//! Journal issue operations: locating, patching and replacing content in a
//! templated issue.
//!
//! Every patcher follows the same shape: a pure `plan_*` function inspects a
//! block snapshot and returns a [`PatchPlan`], which is then applied to the
//! document in one pass. The public `update_*` wrappers do both.

mod articles;
mod finishing;
mod format;
mod instructions;
mod options;
mod patch;
mod pipeline;
mod text;
mod toc;
mod validate;

pub use articles::{
    append_article, append_articles, clear_articles, clear_articles_preserve_editorials,
    default_editorial_headings, delete_after_last_editorial_page, delete_after_page,
    discover_article_files, is_editorial_marker, remove_pages_from, Removal, RemovalStrategy,
    DEFAULT_EDITORIAL_HEADINGS,
};
pub use finishing::{
    AutofitTable, CleanupHorizontalLines, DeleteAfterPage, FinishingPass, FixApostrophe,
    PassParams, PassRegistry, RemoveExtraSpaces, RemoveTextLabels,
};
pub use format::{
    add_page_borders_with_rule, apply_font, apply_line_spacing, apply_page_borders,
    autofit_first_table, cleanup_horizontal_lines, footer_table, install_footer_table,
    is_horizontal_line, page_field_runs, select_capability, set_columns, BorderSpec,
    CapabilityKind, Feature, FormattingCapability, NativeFormatting, PageBorders,
    RawMarkupFormatting, CENTER_RULE_ID, DEFAULT_FOOTER_LABEL,
};
pub use instructions::{
    ColumnsInstruction, Instructions, PageBordersInstruction, PassInstruction, INSTRUCTIONS_FILE,
};
pub use options::{
    current_month_year, AssociateEditor, BusinessInfo, UpdateOptions, UpdateReport,
    DEFAULT_SECTION_TITLE,
};
pub use patch::{
    detect_and_remove_extra_spaces, fix_apostrophe, insert_presidents_message,
    plan_assistant_editors, plan_associate_editors, plan_business_information, plan_extra_spaces,
    plan_front_cover, plan_presidents_message, plan_replacements, remove_text_labels,
    update_assistant_editors, update_associate_editors, update_business_information,
    update_front_cover, update_page2_header, IssueInfo, ParagraphEdit, PatchPlan,
    COVER_LANDMARK, PRESIDENT_PLACEHOLDER,
};
pub use pipeline::{update_journal, update_journal_with, PRESIDENT_MESSAGE_FILE};
pub use text::{eq_fold, fold, is_all_caps, is_blank, normalize};
pub use toc::{find_toc_titles, is_toc_heading, scan_toc, strip_leader, TocScan};
pub use validate::{count_occurrences, validate_issue_number_and_volume};

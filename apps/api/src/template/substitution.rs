//! Field substitution over a loaded document.
//!
//! Cells match on the paragraph's whole text (labels are short and some are
//! substrings of others, e.g. "성명" / "고소인 성명"). Anchors match on a
//! substring because they are long template sentences. Neither reports an
//! error when nothing matches; the counts/flags returned let the caller decide.

use tracing::warn;

use crate::docx::{Document, Paragraph, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    /// The cell paragraph holding the label is overwritten with the value.
    Replace,
    /// The label stays and the value follows it in a new run.
    Append,
}

/// One label to fill in a table.
#[derive(Debug, Clone, Copy)]
pub struct CellEdit<'a> {
    pub label: &'a str,
    pub value: &'a str,
    pub mode: CellMode,
}

/// Applies `edits` in a single walk over the table's cell paragraphs.
///
/// Each paragraph is compared against its original text once and takes the
/// first edit whose label matches exactly, so a value written here is never
/// matched against a later label. Returns the hit count per edit, in order.
pub fn fill_cells(table: &mut Table, edits: &[CellEdit<'_>]) -> Vec<usize> {
    let mut hits = vec![0; edits.len()];
    for paragraph in table.cell_paragraphs_mut() {
        let text = paragraph.text();
        let Some(index) = edits.iter().position(|edit| edit.label == text) else {
            continue;
        };
        let edit = &edits[index];
        match edit.mode {
            CellMode::Replace => paragraph.set_text(edit.value),
            CellMode::Append => paragraph.add_run(edit.value),
        }
        hits[index] += 1;
    }
    hits
}

/// Overwrites every cell paragraph whose text is exactly `match_text`.
/// Returns how many paragraphs were replaced (0 is a silent no-op).
#[allow(dead_code)]
pub fn replace_cell_text(table: &mut Table, match_text: &str, new_value: &str) -> usize {
    fill_one(table, match_text, new_value, CellMode::Replace)
}

/// Like [`replace_cell_text`], but keeps the label and appends `new_value`
/// as an inline run, so the cell reads "label answer" on one line.
#[allow(dead_code)]
pub fn append_run_to_cell(table: &mut Table, match_text: &str, new_value: &str) -> usize {
    fill_one(table, match_text, new_value, CellMode::Append)
}

#[allow(dead_code)]
fn fill_one(table: &mut Table, label: &str, value: &str, mode: CellMode) -> usize {
    fill_cells(table, &[CellEdit { label, value, mode }])[0]
}

/// Inserts a paragraph holding `new_text` right after the first body
/// paragraph containing `anchor_text`. Later matches are left alone.
///
/// Returns `false` (and logs) when the anchor is absent; optional sections of
/// template variants may legitimately be missing.
pub fn insert_after_anchor(document: &mut Document, anchor_text: &str, new_text: &str) -> bool {
    match document.find_paragraph(|p| p.text().contains(anchor_text)) {
        Some(index) => {
            document.insert_paragraph_after(index, Paragraph::new(new_text));
            true
        }
        None => {
            warn!("Anchor not found in template, section skipped: {anchor_text:?}");
            false
        }
    }
}

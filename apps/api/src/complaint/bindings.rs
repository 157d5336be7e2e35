//! Where each field lands in the police complaint template.
//!
//! The assembler walks [`TEMPLATE_BINDINGS`] in order; adding a field to the
//! form means adding a row here, not a branch in the assembler.

use crate::complaint::fields::{keys, ComplaintFields};

pub use crate::template::substitution::CellMode;

/// Requester details.
pub const REQUESTER_TABLE: usize = 0;
/// Respondent details.
pub const RESPONDENT_TABLE: usize = 1;
/// "관련사건의 수사 및 재판 여부" checklist.
pub const CHECKLIST_TABLE: usize = 2;

/// Checklist sentences; the trailing space separates label and answer.
pub const DUPLICATE_FILING_LABEL: &str =
    "본 고소장과 같은 내용의 고소장을 다른 검찰청 또는 경찰서에 제출하거나 제출하였던 사실이 ";
pub const RELATED_INVESTIGATION_LABEL: &str =
    "본 고소장에 기재된 범죄사실과 관련된 사건 또는 공범에 대하여 검찰청이나 경찰서에서 수사 중에 ";

pub const DATE_ANCHOR: &str = "무고죄로 처벌받을 것임을 서약합니다.";
pub const SUBMIT_ANCHOR: &str = "고소대리의 경우에는 제출인을 기재하여야 합니다.";

/// Spaces before the filing date so it sits under the signature column.
pub const DATE_INDENT: usize = 49;
/// Spaces before "<station> 귀중" so it lines up at the page's right side.
pub const SUBMIT_INDENT: usize = 51;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Cell {
        table: usize,
        label: &'static str,
        key: &'static str,
        mode: CellMode,
    },
    Anchor {
        anchor: &'static str,
        key: &'static str,
        /// Text placed before the value (line breaks).
        lead: &'static str,
        /// Spaces between `lead` and the value.
        indent: usize,
    },
}

impl Binding {
    pub fn key(&self) -> &'static str {
        match self {
            Binding::Cell { key, .. } | Binding::Anchor { key, .. } => key,
        }
    }
}

const fn replace(table: usize, key: &'static str) -> Binding {
    Binding::Cell {
        table,
        label: key,
        key,
        mode: CellMode::Replace,
    }
}

const fn section(anchor: &'static str, key: &'static str) -> Binding {
    Binding::Anchor {
        anchor,
        key,
        lead: "\n",
        indent: 0,
    }
}

/// Every binding, in assembly order: requester cells, respondent cells,
/// narrative sections, checklist answers, closing lines.
pub const TEMPLATE_BINDINGS: &[Binding] = &[
    replace(REQUESTER_TABLE, keys::REQUESTER_NAME),
    replace(REQUESTER_TABLE, keys::REQUESTER_RRN),
    replace(REQUESTER_TABLE, keys::REQUESTER_ADDRESS),
    replace(REQUESTER_TABLE, keys::REQUESTER_JOB),
    replace(REQUESTER_TABLE, keys::REQUESTER_PHONE),
    replace(REQUESTER_TABLE, keys::REQUESTER_EMAIL),
    replace(RESPONDENT_TABLE, keys::RESPONDENT_NAME),
    replace(RESPONDENT_TABLE, keys::RESPONDENT_RRN),
    replace(RESPONDENT_TABLE, keys::RESPONDENT_ADDRESS),
    replace(RESPONDENT_TABLE, keys::RESPONDENT_JOB),
    replace(RESPONDENT_TABLE, keys::RESPONDENT_PHONE),
    replace(RESPONDENT_TABLE, keys::RESPONDENT_EMAIL),
    replace(RESPONDENT_TABLE, keys::RESPONDENT_DETAILS),
    section("(죄명 및 피고소인에 대한 처벌의사 기재)", keys::PURPOSE),
    section("4. 범죄사실*", keys::FACTS),
    section("5. 고소이유", keys::REASONS),
    section("6. 증거자료", keys::EVIDENCE),
    section("8. 기타", keys::MISC),
    Binding::Cell {
        table: CHECKLIST_TABLE,
        label: DUPLICATE_FILING_LABEL,
        key: keys::DUPLICATE_FILING,
        mode: CellMode::Append,
    },
    Binding::Cell {
        table: CHECKLIST_TABLE,
        label: RELATED_INVESTIGATION_LABEL,
        key: keys::RELATED_INVESTIGATION,
        mode: CellMode::Append,
    },
    Binding::Anchor {
        anchor: DATE_ANCHOR,
        key: keys::FILING_DATE,
        lead: "\n",
        indent: DATE_INDENT,
    },
    Binding::Anchor {
        anchor: SUBMIT_ANCHOR,
        key: keys::SUBMIT_TO,
        lead: "\n\n",
        indent: SUBMIT_INDENT,
    },
];

/// The text written for `key`: normalized values for the checklist and
/// closing fields, the raw value (or "") for everything else.
pub fn resolve<'a>(fields: &'a ComplaintFields, key: &str) -> &'a str {
    match key {
        keys::DUPLICATE_FILING => fields.duplicate_filing.as_str(),
        keys::RELATED_INVESTIGATION => fields.related_investigation.as_str(),
        keys::FILING_DATE => &fields.filing_date,
        keys::SUBMIT_TO => &fields.submit_to,
        _ => fields.value(key),
    }
}

/// Paragraph text inserted after an anchor.
pub fn anchor_text(lead: &str, indent: usize, value: &str) -> String {
    format!("{lead}{}{value}", " ".repeat(indent))
}

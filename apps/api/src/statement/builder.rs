//! Lays out the statement record (진술 조서) in a fresh document.
//!
//! Unlike the complaint there is no form to fill in: the record is built
//! block by block. The header comes from the complaint's requester fields,
//! the body from the LLM's question/answer draft, and the closing
//! signature table plus the investigation-process sheet (수사 과정 확인서)
//! are fixed text with the requester's name and filing date filled in.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::complaint::assembler::sanitize_component;
use crate::complaint::fields::{keys, ComplaintFields, FieldMap};
use crate::complaint::AssemblyError;
use crate::docx::{Cell, Document, DocxError, Paragraph, Row, Table};

const TITLE: &str = "진술 조서";
const PROCESS_TITLE: &str = "수사 과정 확인서";
const QUESTION_PREFIX: &str = "문: ";
const ANSWER_PREFIX: &str = "답: ";
/// Used in the intro when the complaint does not name the respondent.
const UNKNOWN_RESPONDENT: &str = "성명불상자";

/// Usable page width (A4 less both margins), in twips.
const PAGE_WIDTH: u32 = 9070;
const PROCESS_LABEL_WIDTH: u32 = 3400;

const PROCESS_ROWS: &[&str] = &[
    "1. 조사 장소 도착시각",
    "2. 조사 시작시각 및 종료시각",
    "3. 조서 열람 시작시각 및 종료시각",
    "4. 기타 조사과정 진행경과 확인에 필요한 사항",
    "5. 조사과정 기재사항에 대한 이의 제기나 의견진술 여부 및 그 내용",
];

/// One recorded exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// What the LLM returns for a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementDraft {
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub questions: Vec<QuestionAnswer>,
}

impl StatementDraft {
    /// Trims everything, drops pairs with an empty side, and makes sure each
    /// question reads "문: ..." and each answer "답: ...". The relationship
    /// is prose, so a leading "답:" is removed from it.
    pub fn normalized(self) -> Self {
        let questions = self
            .questions
            .into_iter()
            .filter_map(|qa| {
                let question = strip_marker(&qa.question, "문");
                let answer = strip_marker(&qa.answer, "답");
                if question.is_empty() || answer.is_empty() {
                    return None;
                }
                Some(QuestionAnswer {
                    question: format!("{QUESTION_PREFIX}{question}"),
                    answer: format!("{ANSWER_PREFIX}{answer}"),
                })
            })
            .collect();

        Self {
            relationship: strip_marker(&self.relationship, "답").to_string(),
            questions,
        }
    }
}

fn strip_marker<'a>(text: &'a str, marker: &str) -> &'a str {
    let text = text.trim();
    text.strip_prefix(marker)
        .and_then(|rest| rest.trim_start().strip_prefix(':'))
        .map(str::trim)
        .unwrap_or(text)
}

/// A statement written to the output directory.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedStatement {
    pub file_id: String,
    pub file_name: String,
    pub path: PathBuf,
    pub question_count: usize,
}

/// "AI 고소장 홍길동_사기_153045" → "AI 진술 조서 홍길동_사기_153045".
/// Ids without "고소장" get a prefix instead, so the statement never
/// overwrites its complaint.
pub fn statement_file_id(complaint_file_id: &str) -> String {
    if complaint_file_id.contains("고소장") {
        complaint_file_id.replace("고소장", TITLE)
    } else {
        format!("{TITLE} {complaint_file_id}")
    }
}

#[derive(Debug, Clone)]
pub struct StatementBuilder {
    output_dir: PathBuf,
}

impl StatementBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Renders the statement for a complaint and saves it atomically next to
    /// the complaint's own files.
    pub fn build(
        &self,
        complaint_file_id: &str,
        fields: &FieldMap,
        draft: &StatementDraft,
    ) -> Result<GeneratedStatement, AssemblyError> {
        let fields = ComplaintFields::validate(fields.clone())?;

        let file_id = statement_file_id(&sanitize_component(complaint_file_id));
        let file_name = format!("{file_id}.docx");
        let path = self.output_dir.join(&file_name);
        let save_error = |source: DocxError| AssemblyError::Save {
            path: path.clone(),
            source,
        };

        let document = render(&fields, draft).map_err(save_error)?;
        std::fs::create_dir_all(&self.output_dir).map_err(|e| AssemblyError::Save {
            path: self.output_dir.clone(),
            source: DocxError::Io(e),
        })?;
        document.save(&path).map_err(save_error)?;

        info!(
            "Built statement {} ({} questions)",
            path.display(),
            draft.questions.len()
        );

        Ok(GeneratedStatement {
            file_id,
            file_name,
            path,
            question_count: draft.questions.len(),
        })
    }
}

/// The whole record as a document. `draft` is used as given; normalize it first.
pub fn render(fields: &ComplaintFields, draft: &StatementDraft) -> Result<Document, DocxError> {
    let name = fields.requester_name();
    let filing_date = fields.filing_date.as_str();

    let mut doc = Document::blank()?;
    doc.push_paragraph(Paragraph::bold(TITLE).centered());

    for (label, key) in [
        ("성                  명", keys::REQUESTER_NAME),
        ("주민등록번호", keys::REQUESTER_RRN),
        ("직                  업", keys::REQUESTER_JOB),
        ("주                  거", keys::REQUESTER_ADDRESS),
        ("휴대         전화", keys::REQUESTER_PHONE),
        ("전자         우편", keys::REQUESTER_EMAIL),
    ] {
        doc.push_paragraph(Paragraph::new(&format!("{label}:  {}", fields.value(key).trim())));
    }
    doc.push_paragraph(Paragraph::new(""));

    doc.push_paragraph(Paragraph::new(&intro(fields)));
    doc.push_paragraph(Paragraph::new(""));

    doc.push_paragraph(Paragraph::bold("1. 피의자와의 관계"));
    doc.push_paragraph(Paragraph::new(&format!("   {}", draft.relationship)));
    doc.push_paragraph(Paragraph::new(""));

    doc.push_paragraph(Paragraph::bold("2. 피의사실과의 관계"));
    doc.push_paragraph(Paragraph::new(
        "   저는 피의 사실과 관련하여 고소인 자격으로서 출석하였습니다.",
    ));
    doc.push_paragraph(Paragraph::new(
        "\n 이 때 진술의 취지를 더욱 명백히 하기 위하여 다음과 같이 임의로 문답하다.\n",
    ));

    for qa in &draft.questions {
        doc.push_paragraph(Paragraph::bold(&qa.question));
        doc.push_paragraph(Paragraph::new(&qa.answer));
        doc.push_paragraph(Paragraph::new(""));
    }

    doc.push_table(Table::bordered(
        &[PAGE_WIDTH],
        vec![Row::new(vec![Cell::new(
            vec![Paragraph::new(&format!(
                "\n위의 조서를 진술자에게 열람하게 하였던 바 진술한 대로 오기나 증감·변경할 것이 \
                 없다고 말하므로 서명(기명날인)하게 하다.\n\n\n진술자  {name} (인)\n\n{filing_date}\n"
            ))
            .centered()],
            PAGE_WIDTH,
            1,
        )])],
    ));

    doc.push_paragraph(Paragraph::new(""));
    doc.push_paragraph(Paragraph::bold(PROCESS_TITLE).centered());
    doc.push_table(process_table(name, filing_date));

    Ok(doc)
}

fn intro(fields: &ComplaintFields) -> String {
    let respondent = match fields.value(keys::RESPONDENT_NAME).trim() {
        "" => UNKNOWN_RESPONDENT,
        name => name,
    };
    let station = fields.value(keys::SUBMIT_TO).trim();
    let station = station.strip_suffix("귀중").unwrap_or(station).trim_end();

    format!(
        "위의 사람은 피의자 {respondent}에 대한 {} 피의사건에 관하여 {}에 {station} 조사실에 \
         임의 출석하여 다음과 같이 진술하다.",
        fields.category(),
        fields.filing_date,
    )
}

/// Header row, one row per process item with an empty answer cell, and a
/// merged confirmation row.
fn process_table(name: &str, filing_date: &str) -> Table {
    let content_width = PAGE_WIDTH - PROCESS_LABEL_WIDTH;

    let mut rows = vec![Row::new(vec![
        Cell::new(vec![Paragraph::new("구분").centered()], PROCESS_LABEL_WIDTH, 1),
        Cell::new(vec![Paragraph::new("내용").centered()], content_width, 1),
    ])];
    rows.extend(PROCESS_ROWS.iter().map(|label| {
        Row::new(vec![
            Cell::new(vec![Paragraph::new(label)], PROCESS_LABEL_WIDTH, 1),
            Cell::new(vec![], content_width, 1),
        ])
    }));
    rows.push(Row::new(vec![Cell::new(
        vec![Paragraph::new(&format!(
            "\n{filing_date}\n사법경찰관 경감 ___은 {name}을(를) 조사한 후, 위와 같은 사항에 대해 \
             {name}으로부터 확인받음\n\n확인자 {name} (인)\n\n사법경찰관 ___ (인)\n"
        ))
        .centered()],
        PAGE_WIDTH,
        2,
    )]));

    Table::bordered(&[PROCESS_LABEL_WIDTH, content_width], rows)
}

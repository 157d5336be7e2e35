//! Statement Generation: drafts and publishes the statement record for a
//! stored complaint.
//!
//! Flow: complaint record → stored field map → LLM question/answer draft →
//!       build .docx (blocking pool) → PDF → upload both → link to complaint.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};

use crate::complaint::generator::{read_file, ComplaintFilesResponse};
use crate::complaint::FieldMap;
use crate::db::{get_complaint, set_statement_file_id};
use crate::errors::AppError;
use crate::llm_client::{LlmClient, LlmError};
use crate::pdf::PdfConverter;
use crate::state::AppState;
use crate::statement::builder::{GeneratedStatement, StatementBuilder, StatementDraft};
use crate::statement::prompts::{
    build_statement_prompt, statement_function_schema, STATEMENT_SYSTEM,
};
use crate::storage::{
    statement_docx_key, statement_pdf_key, ObjectStore, DOCX_CONTENT_TYPE, PDF_CONTENT_TYPE,
};

/// A statement after both files reached object storage.
#[derive(Debug, Clone)]
pub struct PublishedStatement {
    pub statement: GeneratedStatement,
    pub pdf_path: PathBuf,
    pub docx_key: String,
    pub pdf_key: String,
}

/// Runs the whole statement pipeline for the complaint `complaint_file_id`.
pub async fn generate_statement(
    state: &AppState,
    complaint_file_id: &str,
) -> Result<ComplaintFilesResponse, AppError> {
    let row = get_complaint(&state.db, complaint_file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Complaint {complaint_file_id} not found")))?;
    let field_map = FieldMap::from_json(&row.field_map)?;

    let draft = draft_statement(&state.llm, &field_map).await?;

    let builder = StatementBuilder::new(state.assembler.output_dir());
    let published = render_and_upload_statement(
        builder,
        state.pdf.as_ref(),
        state.store.as_ref(),
        &row.file_id,
        &field_map,
        draft,
    )
    .await?;

    let file_id = &published.statement.file_id;
    if !set_statement_file_id(&state.db, &row.file_id, file_id).await? {
        // Deleted between the lookup and now; the files are still valid.
        warn!(
            "Complaint {} vanished before statement {file_id} was linked",
            row.file_id
        );
    }

    Ok(ComplaintFilesResponse::for_file(file_id, vec![]))
}

/// Asks the LLM for the question/answer record and normalizes it.
pub async fn draft_statement(llm: &LlmClient, fields: &FieldMap) -> Result<StatementDraft, AppError> {
    let prompt = build_statement_prompt(fields);
    let arguments: Value = llm
        .call_function(&prompt, STATEMENT_SYSTEM, &statement_function_schema())
        .await
        .map_err(llm_error)?;

    let draft: StatementDraft = serde_json::from_value(arguments).map_err(|e| {
        AppError::UnprocessableEntity(format!("LLM response is not a valid statement: {e}"))
    })?;
    let draft = draft.normalized();
    info!("LLM returned {} statement questions", draft.questions.len());
    Ok(draft)
}

fn llm_error(error: LlmError) -> AppError {
    match &error {
        LlmError::Parse(_) | LlmError::MissingFunctionCall => {
            AppError::UnprocessableEntity(format!("LLM response is not a valid statement: {error}"))
        }
        _ => AppError::Llm(format!("Statement drafting LLM call failed: {error}")),
    }
}

/// Builds the statement, converts it and uploads both files.
pub async fn render_and_upload_statement(
    builder: StatementBuilder,
    pdf: &dyn PdfConverter,
    store: &dyn ObjectStore,
    complaint_file_id: &str,
    field_map: &FieldMap,
    draft: StatementDraft,
) -> Result<PublishedStatement, AppError> {
    let complaint_file_id = complaint_file_id.to_string();
    let fields = field_map.clone();
    let statement =
        tokio::task::spawn_blocking(move || builder.build(&complaint_file_id, &fields, &draft))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Statement task failed: {e}")))??;

    let pdf_path = pdf.convert(&statement.path).await?;

    let docx_key = statement_docx_key(&statement.file_id);
    let pdf_key = statement_pdf_key(&statement.file_id);

    store
        .put(&docx_key, read_file(&statement.path).await?, DOCX_CONTENT_TYPE)
        .await?;
    store
        .put(&pdf_key, read_file(&pdf_path).await?, PDF_CONTENT_TYPE)
        .await?;

    info!("Published statement {}", statement.file_id);

    Ok(PublishedStatement {
        statement,
        pdf_path,
        docx_key,
        pdf_key,
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::complaint::fields::keys;
    use crate::complaint::fields::tests::sample_field_map;
    use crate::complaint::AssemblyError;
    use crate::pdf::tests::{BrokenConverter, FakeConverter};
    use crate::pdf::PdfError;
    use crate::statement::builder::QuestionAnswer;
    use crate::storage::tests::MemoryStore;

    fn draft() -> StatementDraft {
        StatementDraft {
            relationship: "대학 동기입니다.".into(),
            questions: vec![QuestionAnswer {
                question: "어떤 죄명으로 고소하셨습니까?".into(),
                answer: "사기죄입니다.".into(),
            }],
        }
        .normalized()
    }

    #[tokio::test]
    async fn test_statement_is_uploaded_under_its_own_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::default();

        let published = render_and_upload_statement(
            StatementBuilder::new(dir.path()),
            &FakeConverter,
            &store,
            "AI 고소장 홍길동_사기_153045",
            &sample_field_map(),
            draft(),
        )
        .await
        .unwrap();

        assert_eq!(published.statement.file_id, "AI 진술 조서 홍길동_사기_153045");
        assert_eq!(
            published.docx_key,
            "statements/AI 진술 조서 홍길동_사기_153045.docx"
        );
        assert!(published.pdf_path.exists());

        let objects = store.objects.lock().unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(&objects[&published.docx_key].0[..2], b"PK");
        assert_eq!(objects[&published.pdf_key].0, Bytes::from_static(b"%PDF-1.4"));
        assert_eq!(objects[&published.pdf_key].1, PDF_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_incomplete_stored_map_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::default();
        let mut map = sample_field_map();
        map.remove(keys::FILING_DATE);

        let err = render_and_upload_statement(
            StatementBuilder::new(dir.path()),
            &FakeConverter,
            &store,
            "AI 고소장 홍길동_사기_153045",
            &map,
            draft(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Assembly(AssemblyError::MissingField(_))));
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_statement_pdf_failure_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::default();

        let err = render_and_upload_statement(
            StatementBuilder::new(dir.path()),
            &BrokenConverter,
            &store,
            "AI 고소장 홍길동_사기_153045",
            &sample_field_map(),
            draft(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Pdf(PdfError::Timeout(_))));
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_llm_output_is_unprocessable() {
        assert!(matches!(
            llm_error(LlmError::MissingFunctionCall),
            AppError::UnprocessableEntity(_)
        ));
        assert!(matches!(
            llm_error(LlmError::RateLimited { retries: 3 }),
            AppError::Llm(_)
        ));
    }
}

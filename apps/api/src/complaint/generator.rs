//! Complaint Generation: orchestrates the full pipeline.
//!
//! Flow: flatten form → LLM field map → assemble .docx (blocking pool) →
//!       PDF → upload both files → upsert complaint record → links.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::complaint::fields::{flatten_form_sections, format_korean_date, keys, FieldMap};
use crate::complaint::prompts::{build_complaint_prompt, complaint_function_schema, COMPLAINT_SYSTEM};
use crate::complaint::{ComplaintAssembler, GeneratedDocument};
use crate::db::upsert_complaint;
use crate::errors::AppError;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::complaint::NewComplaintRecord;
use crate::pdf::PdfConverter;
use crate::state::AppState;
use crate::storage::{docx_key, pdf_key, ObjectStore, DOCX_CONTENT_TYPE, PDF_CONTENT_TYPE};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for complaint generation: form answers grouped by section.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub combined_data: Value,
}

/// Links to the generated files.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintFilesResponse {
    pub file_id: String,
    pub preview_pdf: String,
    pub download_word: String,
    pub download_pdf: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_sections: Vec<String>,
}

impl ComplaintFilesResponse {
    pub fn for_file(file_id: &str, missing_sections: Vec<String>) -> Self {
        let encoded = urlencoding::encode(file_id);
        Self {
            file_id: file_id.to_string(),
            preview_pdf: format!("/api/preview/pdf/{encoded}"),
            download_word: format!("/api/download/word/{encoded}"),
            download_pdf: format!("/api/download/pdf/{encoded}"),
            missing_sections,
        }
    }
}

/// A generated complaint after both files reached object storage.
#[derive(Debug, Clone)]
pub struct PublishedComplaint {
    pub document: GeneratedDocument,
    pub pdf_path: PathBuf,
    pub docx_key: String,
    pub pdf_key: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full pipeline from raw form sections.
pub async fn generate_complaint(
    state: &AppState,
    request: GenerateRequest,
) -> Result<ComplaintFilesResponse, AppError> {
    let field_map = draft_field_map(&state.llm, &request.combined_data).await?;
    publish_field_map(state, field_map).await
}

/// Runs the pipeline from an already drafted (or user-edited) field map.
pub async fn publish_field_map(
    state: &AppState,
    field_map: FieldMap,
) -> Result<ComplaintFilesResponse, AppError> {
    let published = render_and_upload(
        state.assembler.clone(),
        state.pdf.as_ref(),
        state.store.as_ref(),
        &field_map,
    )
    .await?;

    record_complaint(&state.db, &field_map, &published).await?;

    Ok(ComplaintFilesResponse::for_file(
        &published.document.file_id,
        published.document.missing_sections,
    ))
}

/// Asks the LLM to turn the form answers into a field map.
pub async fn draft_field_map(llm: &LlmClient, combined_data: &Value) -> Result<FieldMap, AppError> {
    let form = flatten_form_sections(combined_data);
    if form.is_empty() {
        return Err(AppError::Validation(
            "combined_data must contain at least one section with form fields".to_string(),
        ));
    }
    info!("Drafting complaint from {} form fields", form.len());

    let prompt = build_complaint_prompt(&form);
    let arguments: Value = llm
        .call_function(&prompt, COMPLAINT_SYSTEM, &complaint_function_schema())
        .await
        .map_err(llm_error)?;

    let field_map = FieldMap::from_json(&arguments)?;
    info!("LLM returned {} complaint fields", field_map.len());
    Ok(field_map)
}

fn llm_error(error: LlmError) -> AppError {
    match &error {
        LlmError::Parse(_) | LlmError::MissingFunctionCall => {
            AppError::UnprocessableEntity(format!("LLM response is not a valid field map: {error}"))
        }
        _ => AppError::Llm(format!("Complaint drafting LLM call failed: {error}")),
    }
}

/// Assembles the document, converts it and uploads both files.
///
/// Assembly is synchronous file work, so it runs on the blocking pool.
pub async fn render_and_upload(
    assembler: Arc<ComplaintAssembler>,
    pdf: &dyn PdfConverter,
    store: &dyn ObjectStore,
    field_map: &FieldMap,
) -> Result<PublishedComplaint, AppError> {
    let fields = field_map.clone();
    let document = tokio::task::spawn_blocking(move || assembler.assemble(&fields))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Assembly task failed: {e}")))??;

    for key in &document.missing_sections {
        warn!("Complaint {} has no '{key}' section", document.file_id);
    }

    let pdf_path = pdf.convert(&document.path).await?;

    let docx_key = docx_key(&document.file_id);
    let pdf_key = pdf_key(&document.file_id);

    store
        .put(&docx_key, read_file(&document.path).await?, DOCX_CONTENT_TYPE)
        .await?;
    store
        .put(&pdf_key, read_file(&pdf_path).await?, PDF_CONTENT_TYPE)
        .await?;

    info!("Published complaint {}", document.file_id);

    Ok(PublishedComplaint {
        document,
        pdf_path,
        docx_key,
        pdf_key,
    })
}

pub(crate) async fn read_file(path: &std::path::Path) -> Result<Bytes, AppError> {
    tokio::fs::read(path).await.map(Bytes::from).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to read {}: {e}", path.display()))
    })
}

/// Upserts the complaint record for a published document.
pub async fn record_complaint(
    pool: &PgPool,
    field_map: &FieldMap,
    published: &PublishedComplaint,
) -> Result<(), AppError> {
    let field_map_json = serde_json::to_value(field_map)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize field map: {e}")))?;
    let filing_date = field_map.get(keys::FILING_DATE).map(format_korean_date);

    let document = &published.document;
    upsert_complaint(
        pool,
        &NewComplaintRecord {
            file_id: &document.file_id,
            requester_name: &document.requester_name,
            respondent_name: field_map
                .get(keys::RESPONDENT_NAME)
                .map(str::trim)
                .filter(|n| !n.is_empty()),
            category: &document.category,
            filing_date: filing_date.as_deref(),
            field_map: &field_map_json,
            docx_key: &published.docx_key,
            pdf_key: Some(published.pdf_key.as_str()),
            missing_sections: &document.missing_sections,
        },
    )
    .await?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

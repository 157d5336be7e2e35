//! Axum route handlers for the Complaint API.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::complaint::fields::FieldMap;
use crate::complaint::generator::{
    generate_complaint, publish_field_map, ComplaintFilesResponse, GenerateRequest,
};
use crate::complaint::stations::{load_stations, PoliceStation};
use crate::db::{get_complaint, list_complaints};
use crate::errors::AppError;
use crate::models::complaint::ComplaintRecordRow;
use crate::state::AppState;
use crate::storage::{DOCX_CONTENT_TYPE, PDF_CONTENT_TYPE};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ComplaintSummary {
    pub registration_number: String,
    pub file_id: String,
    pub requester_name: String,
    pub respondent_name: Option<String>,
    pub category: String,
    pub filing_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub links: ComplaintFilesResponse,
    /// Links to the latest statement record, once one was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<ComplaintFilesResponse>,
}

#[derive(Debug, Serialize)]
pub struct ComplaintDetailResponse {
    #[serde(flatten)]
    pub summary: ComplaintSummary,
    pub field_map: Value,
    pub missing_sections: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ComplaintRecordRow> for ComplaintSummary {
    fn from(row: &ComplaintRecordRow) -> Self {
        Self {
            registration_number: row.registration_number(),
            file_id: row.file_id.clone(),
            requester_name: row.requester_name.clone(),
            respondent_name: row.respondent_name.clone(),
            category: row.category.clone(),
            filing_date: row.filing_date.clone(),
            created_at: row.created_at,
            links: ComplaintFilesResponse::for_file(&row.file_id, vec![]),
            statement: row
                .statement_file_id
                .as_deref()
                .map(|id| ComplaintFilesResponse::for_file(id, vec![])),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FileKind {
    Word,
    Pdf,
}

impl FileKind {
    fn extension(self) -> &'static str {
        match self {
            FileKind::Word => "docx",
            FileKind::Pdf => "pdf",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            FileKind::Word => DOCX_CONTENT_TYPE,
            FileKind::Pdf => PDF_CONTENT_TYPE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            FileKind::Word => "Word",
            FileKind::Pdf => "PDF",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/complaint/generate
///
/// Form sections → LLM field map → .docx + .pdf. Returns file links.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<ComplaintFilesResponse>, AppError> {
    let response = generate_complaint(&state, request).await?;
    Ok(Json(response))
}

/// POST /api/complaint/assemble
///
/// Re-renders from a field map the caller already has (e.g. after editing
/// the LLM draft). Skips the LLM.
pub async fn handle_assemble(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ComplaintFilesResponse>, AppError> {
    let field_map = FieldMap::from_json(&body)?;
    let response = publish_field_map(&state, field_map).await?;
    Ok(Json(response))
}

/// GET /api/complaints
pub async fn handle_list_complaints(
    State(state): State<AppState>,
) -> Result<Json<Vec<ComplaintSummary>>, AppError> {
    let rows = list_complaints(&state.db).await?;
    Ok(Json(rows.iter().map(ComplaintSummary::from).collect()))
}

/// GET /api/complaints/:file_id
pub async fn handle_get_complaint(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<ComplaintDetailResponse>, AppError> {
    let file_id = validate_file_id(&file_id)?;
    let row = get_complaint(&state.db, file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Complaint {file_id} not found")))?;

    Ok(Json(ComplaintDetailResponse {
        summary: ComplaintSummary::from(&row),
        field_map: row.field_map,
        missing_sections: row.missing_sections,
        updated_at: row.updated_at,
    }))
}

/// GET /api/download/word/:file_id
pub async fn handle_download_word(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    serve_file(&state, &file_id, FileKind::Word, "attachment").await
}

/// GET /api/download/pdf/:file_id
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    serve_file(&state, &file_id, FileKind::Pdf, "attachment").await
}

/// GET /api/preview/pdf/:file_id
pub async fn handle_preview_pdf(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    serve_file(&state, &file_id, FileKind::Pdf, "inline").await
}

/// GET /api/police/stations
pub async fn handle_police_stations(
    State(state): State<AppState>,
) -> Result<Json<Vec<PoliceStation>>, AppError> {
    let stations = load_stations(&state.config.stations_csv_path).await?;
    Ok(Json(stations))
}

async fn serve_file(
    state: &AppState,
    file_id: &str,
    kind: FileKind,
    disposition: &str,
) -> Result<Response, AppError> {
    let file_id = validate_file_id(file_id)?;
    let file_name = format!("{file_id}.{}", kind.extension());
    let path = state.assembler.output_dir().join(&file_name);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("{} file not found", kind.label())));
        }
        Err(e) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, kind.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(disposition, &file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Rejects ids that could address anything outside the output directory.
pub fn validate_file_id(file_id: &str) -> Result<&str, AppError> {
    let invalid = file_id.trim().is_empty()
        || file_id.contains(['/', '\\'])
        || file_id.contains("..")
        || file_id.chars().any(char::is_control);
    if invalid {
        return Err(AppError::Validation(format!("Invalid file id: {file_id:?}")));
    }
    Ok(file_id)
}

/// `inline|attachment; filename="<ascii>"; filename*=UTF-8''<percent-encoded>`
fn content_disposition(disposition: &str, file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "{disposition}; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

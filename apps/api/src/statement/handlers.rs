//! Axum route handlers for statement records.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::complaint::generator::ComplaintFilesResponse;
use crate::complaint::handlers::validate_file_id;
use crate::errors::AppError;
use crate::state::AppState;
use crate::statement::generator::generate_statement;

/// POST /api/complaints/:file_id/statement
///
/// Drafts the statement record for a stored complaint. The files are served
/// by the regular download and preview routes under the returned file id.
pub async fn handle_generate_statement(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<ComplaintFilesResponse>, AppError> {
    let file_id = validate_file_id(&file_id)?;
    let response = generate_statement(&state, file_id).await?;
    Ok(Json(response))
}

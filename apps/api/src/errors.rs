use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::complaint::stations::StationsError;
use crate::complaint::AssemblyError;
use crate::pdf::PdfError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Station list error: {0}")]
    Stations(#[from] StationsError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Assembly(e) if e.is_validation() => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ASSEMBLY_VALIDATION_ERROR",
                e.to_string(),
            ),
            AppError::Assembly(e) => {
                tracing::error!("Assembly error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ASSEMBLY_ERROR",
                    e.public_message(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Pdf(e) => {
                tracing::error!("PDF error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PDF_ERROR",
                    "PDF conversion failed".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Stations(e) => {
                tracing::error!("Station list error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STATIONS_ERROR",
                    "The police station list is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateError;

    fn status_of(error: AppError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn test_field_errors_are_422() {
        assert_eq!(
            status_of(AssemblyError::MissingField("범죄 사실".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(
                AssemblyError::InvalidEnumValue {
                    field: "중복 고소 여부".into(),
                    value: "모름".into()
                }
                .into()
            ),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    async fn body_of(error: AppError) -> serde_json::Value {
        let body = axum::body::to_bytes(error.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_template_errors_are_500() {
        let err: AppError =
            AssemblyError::Template(TemplateError::NotFound("forms/x.docx".into())).into();
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_server_side_assembly_errors_give_reason_without_paths() {
        let body = body_of(
            AssemblyError::Template(TemplateError::NotFound("/srv/forms/x.docx".into())).into(),
        )
        .await;
        assert_eq!(body["error"]["code"], "ASSEMBLY_ERROR");
        assert_eq!(body["error"]["message"], "assembly failed: template not found");

        let body = body_of(
            AssemblyError::Save {
                path: "/srv/storage/a.docx".into(),
                source: crate::docx::DocxError::MissingBody,
            }
            .into(),
        )
        .await;
        let message = body["error"]["message"].as_str().unwrap();
        assert_eq!(message, "assembly failed: document could not be saved");
        assert!(!message.contains("/srv"));
    }

    #[tokio::test]
    async fn test_validation_assembly_errors_keep_field_name() {
        let body = body_of(AssemblyError::MissingField("범죄 사실".into()).into()).await;
        assert_eq!(
            body["error"]["message"],
            "assembly failed: required field '범죄 사실' is missing"
        );
    }

    #[test]
    fn test_assembly_message_prefix() {
        let err = AssemblyError::MissingField("고소 이유".into());
        assert_eq!(
            err.to_string(),
            "assembly failed: required field '고소 이유' is missing"
        );
    }

    #[test]
    fn test_not_found_and_validation_statuses() {
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(PdfError::Timeout(120).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

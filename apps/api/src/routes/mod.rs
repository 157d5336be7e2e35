pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::complaint::handlers;
use crate::state::AppState;
use crate::statement::handlers as statement_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Complaint generation
        .route("/api/complaint/generate", post(handlers::handle_generate))
        .route("/api/complaint/assemble", post(handlers::handle_assemble))
        // Complaint records
        .route("/api/complaints", get(handlers::handle_list_complaints))
        .route(
            "/api/complaints/:file_id",
            get(handlers::handle_get_complaint),
        )
        .route(
            "/api/complaints/:file_id/statement",
            post(statement_handlers::handle_generate_statement),
        )
        // Generated files
        .route(
            "/api/download/word/:file_id",
            get(handlers::handle_download_word),
        )
        .route(
            "/api/download/pdf/:file_id",
            get(handlers::handle_download_pdf),
        )
        .route(
            "/api/preview/pdf/:file_id",
            get(handlers::handle_preview_pdf),
        )
        // Form support
        .route(
            "/api/police/stations",
            get(handlers::handle_police_stations),
        )
        .with_state(state)
}

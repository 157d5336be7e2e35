use std::sync::Arc;

use sqlx::PgPool;

use crate::complaint::ComplaintAssembler;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pdf::PdfConverter;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Generated .docx/.pdf copies. Default: S3Store.
    pub store: Arc<dyn ObjectStore>,
    pub llm: LlmClient,
    pub config: Config,
    /// Stateless apart from its paths; every call loads its own template copy.
    pub assembler: Arc<ComplaintAssembler>,
    /// Pluggable converter. Default: LibreOfficeConverter.
    pub pdf: Arc<dyn PdfConverter>,
}

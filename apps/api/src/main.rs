mod complaint;
mod config;
mod db;
mod docx;
mod errors;
mod llm_client;
mod models;
mod pdf;
mod routes;
mod state;
mod statement;
mod storage;
mod template;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::complaint::ComplaintAssembler;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::pdf::LibreOfficeConverter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3Store;
use crate::template::TemplateLoader;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Complaint API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let store = Arc::new(S3Store::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(
        &config.llm_base_url,
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    )?;
    info!(
        "LLM client initialized ({}, model: {})",
        config.llm_base_url,
        config.llm_model.as_deref().unwrap_or("auto")
    );

    // Template is read on every request; a missing file only fails requests
    let loader = TemplateLoader::new(&config.template_path);
    if !loader.path().is_file() {
        warn!("Complaint template not found at {}", loader.path().display());
    }
    let assembler = Arc::new(ComplaintAssembler::new(
        loader,
        &config.output_dir,
        config.output_file_prefix.clone(),
    ));

    let pdf = Arc::new(
        LibreOfficeConverter::new(
            config.libreoffice_cmd.clone(),
            Duration::from_secs(config.pdf_timeout_secs),
        )
        .with_max_parallel(config.pdf_max_parallel),
    );
    info!(
        "PDF converter: {} (up to {} at once)",
        pdf.command(),
        pdf.max_parallel()
    );

    // Build app state
    let state = AppState {
        db,
        store,
        llm,
        config: config.clone(),
        assembler,
        pdf,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the form frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "complaint-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::models::complaint::{ComplaintRecordRow, NewComplaintRecord};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates `complaint_documents` if this is a fresh database.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS complaint_documents (
            file_id          TEXT PRIMARY KEY,
            requester_name   TEXT NOT NULL,
            respondent_name  TEXT,
            category         TEXT NOT NULL,
            filing_date      TEXT,
            field_map        JSONB NOT NULL,
            docx_key         TEXT NOT NULL,
            pdf_key          TEXT,
            missing_sections TEXT[] NOT NULL DEFAULT '{}',
            statement_file_id TEXT,
            created_at       TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at       TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Databases created before statements existed
    sqlx::query(
        "ALTER TABLE complaint_documents ADD COLUMN IF NOT EXISTS statement_file_id TEXT",
    )
    .execute(pool)
    .await?;

    info!("Schema ready");
    Ok(())
}

// Numbering restarts every calendar year (UTC, independent of the session
// TimeZone); re-generated files keep their slot because an upsert does not
// touch created_at.
const NUMBERED_RECORDS: &str = r#"
    SELECT * FROM (
        SELECT file_id, requester_name, respondent_name, category, filing_date,
               field_map, docx_key, pdf_key, missing_sections, statement_file_id,
               created_at, updated_at, registration_year,
               ROW_NUMBER() OVER (
                   PARTITION BY registration_year
                   ORDER BY created_at, file_id
               ) AS seq
        FROM (
            SELECT *, EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT4 AS registration_year
            FROM complaint_documents
        ) dated
    ) numbered
"#;

/// Inserts a record, or refreshes it when the file id already exists
/// (same requester, category and second).
pub async fn upsert_complaint(
    pool: &PgPool,
    record: &NewComplaintRecord<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO complaint_documents
            (file_id, requester_name, respondent_name, category, filing_date,
             field_map, docx_key, pdf_key, missing_sections)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (file_id) DO UPDATE SET
            requester_name   = EXCLUDED.requester_name,
            respondent_name  = EXCLUDED.respondent_name,
            category         = EXCLUDED.category,
            filing_date      = EXCLUDED.filing_date,
            field_map        = EXCLUDED.field_map,
            docx_key         = EXCLUDED.docx_key,
            pdf_key          = EXCLUDED.pdf_key,
            missing_sections = EXCLUDED.missing_sections,
            updated_at       = now()
        "#,
    )
    .bind(record.file_id)
    .bind(record.requester_name)
    .bind(record.respondent_name)
    .bind(record.category)
    .bind(record.filing_date)
    .bind(record.field_map)
    .bind(record.docx_key)
    .bind(record.pdf_key)
    .bind(record.missing_sections)
    .execute(pool)
    .await?;

    info!("Recorded complaint {}", record.file_id);
    Ok(())
}

/// Links the latest statement to its complaint. Returns false when the
/// complaint does not exist.
pub async fn set_statement_file_id(
    pool: &PgPool,
    complaint_file_id: &str,
    statement_file_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE complaint_documents
        SET statement_file_id = $2, updated_at = now()
        WHERE file_id = $1
        "#,
    )
    .bind(complaint_file_id)
    .bind(statement_file_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All records, newest first.
pub async fn list_complaints(pool: &PgPool) -> Result<Vec<ComplaintRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, ComplaintRecordRow>(&format!(
        "{NUMBERED_RECORDS} ORDER BY created_at DESC, file_id DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn get_complaint(
    pool: &PgPool,
    file_id: &str,
) -> Result<Option<ComplaintRecordRow>, sqlx::Error> {
    sqlx::query_as::<_, ComplaintRecordRow>(&format!("{NUMBERED_RECORDS} WHERE file_id = $1"))
        .bind(file_id)
        .fetch_optional(pool)
        .await
}

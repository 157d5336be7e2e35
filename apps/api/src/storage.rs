//! Object storage for generated complaint files (S3 or MinIO).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const KEY_PREFIX: &str = "complaints";
const STATEMENT_KEY_PREFIX: &str = "statements";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 upload of {key} failed: {message}")]
    Upload { key: String, message: String },
}

/// Carried in `AppState` as `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError>;
}

pub fn docx_key(file_id: &str) -> String {
    format!("{KEY_PREFIX}/{file_id}.docx")
}

pub fn pdf_key(file_id: &str) -> String {
    format!("{KEY_PREFIX}/{file_id}.pdf")
}

pub fn statement_docx_key(file_id: &str) -> String {
    format!("{STATEMENT_KEY_PREFIX}/{file_id}.docx")
}

pub fn statement_pdf_key(file_id: &str) -> String {
    format!("{STATEMENT_KEY_PREFIX}/{file_id}.pdf")
}

#[derive(Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Records uploads instead of sending them.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub objects: Mutex<HashMap<String, (Bytes, String)>>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (body, content_type.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_object_keys() {
        assert_eq!(
            docx_key("AI 고소장 홍길동_사기_153045"),
            "complaints/AI 고소장 홍길동_사기_153045.docx"
        );
        assert_eq!(pdf_key("x"), "complaints/x.pdf");
        assert_eq!(statement_docx_key("x"), "statements/x.docx");
        assert_eq!(statement_pdf_key("x"), "statements/x.pdf");
    }

    #[tokio::test]
    async fn test_memory_store_through_trait_object() {
        let store = MemoryStore::default();
        let dyn_store: &dyn ObjectStore = &store;
        dyn_store
            .put(&pdf_key("a"), Bytes::from_static(b"%PDF"), PDF_CONTENT_TYPE)
            .await
            .unwrap();
        let objects = store.objects.lock().unwrap();
        assert_eq!(objects["complaints/a.pdf"].1, "application/pdf");
    }
}

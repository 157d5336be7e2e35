use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::docx::Document;
use crate::template::TemplateError;

/// Opens the read-only template from disk.
///
/// Every call reads and parses the file again, so each caller gets its own
/// document and nothing mutable is shared between concurrent requests.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    path: PathBuf,
}

impl TemplateLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Document, TemplateError> {
        let bytes = std::fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TemplateError::NotFound(self.path.clone()),
            _ => TemplateError::Io {
                path: self.path.clone(),
                source: e,
            },
        })?;

        let document = Document::from_bytes(&bytes).map_err(|e| TemplateError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            "Loaded template {} ({} bytes, {} tables, {} paragraphs)",
            self.path.display(),
            bytes.len(),
            document.tables().count(),
            document.paragraphs().count()
        );
        Ok(document)
    }
}

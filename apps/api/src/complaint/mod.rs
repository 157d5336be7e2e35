//! Criminal complaint (고소장) generation.
//!
//! Flow: form sections → LLM field map → validated fields → template
//! assembly (.docx) → PDF → object storage + complaint record.

pub mod assembler;
pub mod bindings;
pub mod fields;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod stations;

use std::path::PathBuf;

use thiserror::Error;

use crate::docx::DocxError;
use crate::template::TemplateError;

pub use assembler::{ComplaintAssembler, GeneratedDocument};
pub use fields::FieldMap;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("assembly failed: {0}")]
    Template(#[from] TemplateError),

    #[error("assembly failed: required field '{0}' is missing")]
    MissingField(String),

    #[error("assembly failed: '{field}' must be 있음 or 없음, got '{value}'")]
    InvalidEnumValue { field: String, value: String },

    #[error("assembly failed: {0}")]
    InvalidFieldMap(String),

    #[error("assembly failed: could not save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: DocxError,
    },
}

impl AssemblyError {
    /// True for errors caused by the field map rather than the server.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AssemblyError::MissingField(_)
                | AssemblyError::InvalidEnumValue { .. }
                | AssemblyError::InvalidFieldMap(_)
        )
    }

    /// "assembly failed: <reason>" without server paths or I/O detail.
    pub fn public_message(&self) -> String {
        let reason = match self {
            AssemblyError::Template(TemplateError::NotFound(_)) => "template not found",
            AssemblyError::Template(TemplateError::Corrupt { .. }) => "template is corrupt",
            AssemblyError::Template(TemplateError::Io { .. }) => "template could not be read",
            AssemblyError::Save { .. } => "document could not be saved",
            other => return other.to_string(),
        };
        format!("assembly failed: {reason}")
    }
}

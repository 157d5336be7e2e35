// Template loading and field substitution.
// The engine is generic over any .docx form; what goes where lives with the
// caller (see complaint::bindings).

pub mod loader;
pub mod substitution;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::TemplateLoader;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("template {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

//! Code generation errors.

use groundwork_core::GroundError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error(transparent)]
    Ground(#[from] GroundError),
    #[error("template '{template}' is missing a binding for slot '{slot}'")]
    MissingTemplateSlot { template: String, slot: String },
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
    #[error("malformed template '{template}': {detail}")]
    MalformedTemplate { template: String, detail: String },
    #[error("failed to read template {path}: {source}")]
    TemplateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid term in {context}: {detail}")]
    InvalidTerm { context: String, detail: String },
}

pub type GenResult<T> = Result<T, GenError>;

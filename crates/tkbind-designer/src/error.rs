//! Error types for the designer

use thiserror::Error;
use tkbind::TkError;

/// Errors surfaced by the form model, persistence and preview
#[derive(Debug, Error)]
pub enum DesignerError {
    #[error(transparent)]
    Tk(#[from] TkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid form document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("duplicate widget id '{0}'")]
    DuplicateId(String),

    #[error("widget '{id}' refers to unknown parent '{parent}'")]
    MissingParent { id: String, parent: String },

    #[error("unknown widget '{0}'")]
    UnknownWidget(String),

    #[error("inconsistent form: {0}")]
    Inconsistent(String),

    #[error("config directory not found")]
    NoConfigDir,
}

/// Result type alias for designer operations
pub type DesignerResult<T> = Result<T, DesignerError>;

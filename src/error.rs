use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotaError {
    #[error("Cannot read document {path}: {reason}")]
    DocumentUnreadable { path: String, reason: String },

    #[error("Unsupported document format: {0} (expected .txt or .json)")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NotaError>;

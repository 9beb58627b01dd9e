//! Error types for CineRAG.

use thiserror::Error;

/// Library-level error type for CineRAG operations.
#[derive(Error, Debug)]
pub enum CineRagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream call timed out after {0}s")]
    UpstreamTimeout(u64),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl CineRagError {
    /// HTTP status code this error surfaces as at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            CineRagError::Validation(_) => 400,
            CineRagError::Auth(_) => 401,
            CineRagError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

/// Result type alias for CineRAG operations.
pub type Result<T> = std::result::Result<T, CineRagError>;

//! Error types for fushigi-core

use thiserror::Error;

/// Result type alias using fushigi-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fushigi-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local durable store failure that is not a SQLite error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote data provider failure
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Classified failures from the remote data provider.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Remote returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Invalid response payload: {0}")]
    Decode(String),
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Failures returned to the caller of a journal submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl SubmitError {
    /// Whether the submission was rejected before any network call.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

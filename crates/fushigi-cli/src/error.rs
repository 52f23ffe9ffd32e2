use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fushigi_core::Error),
    #[error(transparent)]
    Remote(#[from] fushigi_core::RemoteError),
    #[error(transparent)]
    Submit(#[from] fushigi_core::SubmitError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Grammar point ID cannot be empty")]
    EmptyId,
    #[error("Grammar point not found for id/prefix: {0}")]
    GrammarNotFound(String),
    #[error("{0}")]
    AmbiguousId(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

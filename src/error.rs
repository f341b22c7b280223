// src/error.rs
use serde::Serialize;
use thiserror::Error;

/// Persistence failures. Fatal to the run that hit them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("preparing store location: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("persisting stage failed: {0}")]
    Store(#[from] StoreError),
}

/// A single source that could not be fetched or parsed. Recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reason: reason.into(),
        }
    }

    /// Flattens an adapter error chain into one line (`outer: inner: root`).
    pub fn from_error(source: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::new(source, format!("{err:#}"))
    }
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

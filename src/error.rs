//! Error types for the shortsmith content pipeline.

use thiserror::Error;

/// Failure of a single request against a text or image backend.
///
/// These are always soft: the image path rotates to the next backend and the
/// text path falls back to the local template. They never end a run.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Transport(String),
}

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Pipeline panicked: {0}")]
    Panicked(String),

    #[error("Run failed: {0}")]
    RunFailed(String),
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

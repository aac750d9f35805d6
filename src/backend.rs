//! Generation Backends
//!
//! HTTP clients for the hosted inference endpoints the pipeline talks to: one text
//! backend that produces the script and an ordered pool of image backends. Both sit
//! behind small async traits so the generators can be driven by scripted backends
//! in tests.

use crate::error::{BackendError, PipelineError};
use reqwest::Client;
use std::time::Duration;

pub mod image;
pub mod text;

pub use image::{BackendResponse, HttpImageBackend, ImageBackend};
pub use text::{HttpTextBackend, TextBackend, TextParameters};

const BACKEND_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared reqwest client. Per-request timeouts are set by each call.
pub(crate) fn build_backend_http_client() -> Result<Client, PipelineError> {
    Client::builder()
        .connect_timeout(BACKEND_HTTP_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| PipelineError::Config(format!("Failed to create HTTP client: {}", e)))
}

// Helper function to map transport errors to BackendError
pub(crate) fn map_http_error(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout(error.to_string())
    } else if error.is_connect() {
        BackendError::Connection(error.to_string())
    } else if let Some(status) = error.status() {
        BackendError::Status {
            status: status.as_u16(),
            body: error.to_string(),
        }
    } else {
        BackendError::Transport(error.to_string())
    }
}

/// Short display name for an endpoint: the last path segment of its URL.
pub fn model_name(endpoint: &str) -> &str {
    endpoint
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(endpoint)
}

//! Image backends: hosted diffusion models that answer `{inputs}` with image bytes.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::backend::{build_backend_http_client, map_http_error};
use crate::error::{BackendError, PipelineError};

/// Raw answer of an image backend. Any status is returned as-is; the image
/// generator decides what counts as a usable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl BackendResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Image backend client trait
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Send one generation request. `Err` is reserved for transport failures
    /// (timeout, connection refused); HTTP error statuses come back as `Ok`.
    async fn generate(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> Result<BackendResponse, BackendError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    inputs: &'a str,
}

/// HTTP image backend (Hugging Face inference API shape).
pub struct HttpImageBackend {
    client: Client,
    endpoint: String,
    api_token: String,
}

impl HttpImageBackend {
    pub fn new(endpoint: String, api_token: String) -> Result<Self, PipelineError> {
        Ok(Self {
            client: build_backend_http_client()?,
            endpoint,
            api_token,
        })
    }

    /// Build one backend per endpoint, all sharing a single connection pool.
    pub fn pool(endpoints: &[String], api_token: &str) -> Result<Vec<Self>, PipelineError> {
        let client = build_backend_http_client()?;
        Ok(endpoints
            .iter()
            .map(|endpoint| Self {
                client: client.clone(),
                endpoint: endpoint.clone(),
                api_token: api_token.to_string(),
            })
            .collect())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageBackend for HttpImageBackend {
    async fn generate(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> Result<BackendResponse, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .timeout(timeout)
            .json(&ImageGenerationRequest { inputs: prompt })
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(map_http_error)?.to_vec();

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }

    fn name(&self) -> &str {
        crate::backend::model_name(&self.endpoint)
    }
}

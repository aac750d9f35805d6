//! Text backend: a hosted text-generation model returning `[{"generated_text": ...}]`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{build_backend_http_client, map_http_error};
use crate::error::{BackendError, PipelineError};

/// Text backend client trait
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Generate text for a fully rendered prompt. Only non-empty text counts as success.
    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Sampling parameters sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParameters {
    pub max_length: u32,
    pub temperature: f32,
    pub do_sample: bool,
}

impl Default for TextParameters {
    fn default() -> Self {
        Self {
            max_length: 1000,
            temperature: 0.7,
            do_sample: true,
        }
    }
}

#[derive(Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: &'a TextParameters,
}

#[derive(Deserialize)]
struct GeneratedItem {
    #[serde(default)]
    generated_text: Option<String>,
}

/// HTTP text backend (Hugging Face inference API shape).
pub struct HttpTextBackend {
    client: Client,
    endpoint: String,
    api_token: String,
    parameters: TextParameters,
    timeout: Duration,
}

impl HttpTextBackend {
    pub fn new(
        endpoint: String,
        api_token: String,
        parameters: TextParameters,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let client = build_backend_http_client()?;
        Ok(Self {
            client,
            endpoint,
            api_token,
            parameters,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextBackend for HttpTextBackend {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let request = TextGenerationRequest {
            inputs: prompt,
            parameters: &self.parameters,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let items: Vec<GeneratedItem> = response.json().await.map_err(|e| {
            BackendError::MalformedResponse(format!("Failed to parse response: {}", e))
        })?;

        items
            .into_iter()
            .next()
            .and_then(|item| item.generated_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                BackendError::MalformedResponse("No generated_text in response".to_string())
            })
    }

    fn name(&self) -> &str {
        crate::backend::model_name(&self.endpoint)
    }
}

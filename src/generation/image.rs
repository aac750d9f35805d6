//! Image generation over a rotating pool of backends.
//!
//! Every prompt tries each backend in the pool at most once, starting at a cursor
//! shared by all prompts (and all runs) that use the same [`ImageGenerator`]. The
//! cursor advances after every attempt, successful or not, so a backend that is
//! still loading for one prompt is not the first one hit by the next.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{BackendResponse, ImageBackend};
use crate::error::{BackendError, PipelineError};

/// Bodies at or below this size are not treated as images.
pub const DEFAULT_MIN_IMAGE_BYTES: usize = 1000;
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Whether a successful response body is usable image data: an image content
/// type, or a body strictly larger than `min_bytes` for backends that omit the header.
pub fn is_image_like(content_type: Option<&str>, body_len: usize, min_bytes: usize) -> bool {
    let typed_image = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("image"))
        .unwrap_or(false);
    typed_image || body_len > min_bytes
}

/// Classification of a single backend attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// 200 with an image-like body
    Image,
    /// 200 but the body is not image data, usually a JSON error
    NotImageLike {
        loading_estimate: Option<f64>,
        detail: String,
    },
    /// 503: model is loading
    Loading,
    /// 429
    RateLimited,
    HttpError { status: u16, detail: String },
    Timeout,
    Transport(String),
}

impl AttemptOutcome {
    pub fn classify(
        result: &Result<BackendResponse, BackendError>,
        min_image_bytes: usize,
    ) -> Self {
        match result {
            Ok(response) => Self::from_response(response, min_image_bytes),
            Err(err) if err.is_timeout() => AttemptOutcome::Timeout,
            Err(err) => AttemptOutcome::Transport(err.to_string()),
        }
    }

    fn from_response(response: &BackendResponse, min_image_bytes: usize) -> Self {
        match response.status {
            200 => {
                if is_image_like(
                    response.content_type.as_deref(),
                    response.body.len(),
                    min_image_bytes,
                ) {
                    AttemptOutcome::Image
                } else {
                    let parsed: Option<Value> = serde_json::from_slice(&response.body).ok();
                    AttemptOutcome::NotImageLike {
                        loading_estimate: parsed
                            .as_ref()
                            .and_then(|v| v.get("estimated_time"))
                            .and_then(Value::as_f64),
                        detail: body_excerpt(&response.body),
                    }
                }
            }
            503 => AttemptOutcome::Loading,
            429 => AttemptOutcome::RateLimited,
            status => AttemptOutcome::HttpError {
                status,
                detail: body_excerpt(&response.body),
            },
        }
    }
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().take(200).collect()
}

/// Ordered image backends plus the shared rotation cursor.
pub struct BackendPool {
    backends: Vec<Arc<dyn ImageBackend>>,
    cursor: Mutex<usize>,
}

impl BackendPool {
    /// An empty pool is a configuration error.
    pub fn new(backends: Vec<Arc<dyn ImageBackend>>) -> Result<Self, PipelineError> {
        if backends.is_empty() {
            return Err(PipelineError::Config(
                "Image backend pool is empty".to_string(),
            ));
        }
        Ok(Self {
            backends,
            cursor: Mutex::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Index the next attempt will use.
    pub fn cursor(&self) -> usize {
        *self.cursor.lock()
    }

    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Return the position under the cursor and advance it in one step, so
    /// concurrent callers never observe the same position.
    fn advance(&self) -> usize {
        let mut cursor = self.cursor.lock();
        let index = *cursor;
        *cursor = (index + 1) % self.backends.len();
        index
    }

    /// Positions one prompt tries, starting at the claimed cursor and covering
    /// every backend once. The shared cursor still moves on every attempt.
    fn sweep(&self) -> impl Iterator<Item = (usize, Arc<dyn ImageBackend>)> + '_ {
        let len = self.backends.len();
        let start = self.advance();
        (0..len).map(move |offset| {
            if offset > 0 {
                self.advance();
            }
            let index = (start + offset) % len;
            (index, Arc::clone(&self.backends[index]))
        })
    }
}

/// Timing and acceptance policy for image attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePolicy {
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
    pub min_image_bytes: usize,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            min_image_bytes: DEFAULT_MIN_IMAGE_BYTES,
        }
    }
}

/// The image written for a prompt.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub backend: String,
    pub data: Vec<u8>,
    /// Attempts made for this prompt, including the successful one
    pub attempts: usize,
}

pub struct ImageGenerator {
    pool: BackendPool,
    policy: ImagePolicy,
}

impl ImageGenerator {
    pub fn new(pool: BackendPool, policy: ImagePolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    pub fn policy(&self) -> &ImagePolicy {
        &self.policy
    }

    /// Generate one image for `prompt` and write it to `output`.
    ///
    /// Returns `Ok(None)` when every backend failed; nothing is left at `output`
    /// in that case. `Err` is reserved for failures writing or reading `output`.
    pub async fn generate(
        &self,
        prompt: &str,
        output: &Path,
    ) -> Result<Option<GeneratedImage>, PipelineError> {
        let attempts = self.pool.len();
        debug!(prompt = %excerpt(prompt, 100), attempts, "Generating image");

        for (attempt, (index, backend)) in self.pool.sweep().enumerate() {
            debug!(
                backend = backend.name(),
                pool_index = index,
                attempt = attempt + 1,
                "Trying image backend"
            );

            if let Some(data) = self.attempt(backend.as_ref(), prompt, output).await? {
                info!(
                    backend = backend.name(),
                    path = %output.display(),
                    bytes = data.len(),
                    "Image saved"
                );
                return Ok(Some(GeneratedImage {
                    backend: backend.name().to_string(),
                    data,
                    attempts: attempt + 1,
                }));
            }

            if attempt + 1 < attempts && !self.policy.retry_delay.is_zero() {
                tokio::time::sleep(self.policy.retry_delay).await;
            }
        }

        warn!(prompt = %excerpt(prompt, 50), attempts, "All image backends failed");
        Ok(None)
    }

    async fn attempt(
        &self,
        backend: &dyn ImageBackend,
        prompt: &str,
        output: &Path,
    ) -> Result<Option<Vec<u8>>, PipelineError> {
        let timeout = self.policy.attempt_timeout;
        let result = match tokio::time::timeout(timeout, backend.generate(prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(format!(
                "no response within {}s",
                timeout.as_secs()
            ))),
        };

        let name = backend.name();
        match AttemptOutcome::classify(&result, self.policy.min_image_bytes) {
            AttemptOutcome::Image => {
                let body = match result {
                    Ok(response) => response.body,
                    Err(_) => return Ok(None),
                };
                self.write_asset(output, &body).await
            }
            AttemptOutcome::NotImageLike {
                loading_estimate: Some(wait),
                ..
            } => {
                info!(backend = name, estimated_wait_secs = wait, "Model loading, trying next backend");
                Ok(None)
            }
            AttemptOutcome::NotImageLike { detail, .. } => {
                warn!(backend = name, response = %detail, "Unexpected non-image response");
                Ok(None)
            }
            AttemptOutcome::Loading => {
                info!(backend = name, "Model is loading, trying next backend");
                Ok(None)
            }
            AttemptOutcome::RateLimited => {
                warn!(backend = name, "Rate limited, trying next backend");
                Ok(None)
            }
            AttemptOutcome::HttpError { status, detail } => {
                warn!(backend = name, status, response = %detail, "Image backend error");
                Ok(None)
            }
            AttemptOutcome::Timeout => {
                warn!(backend = name, "Image backend timed out, trying next backend");
                Ok(None)
            }
            AttemptOutcome::Transport(error) => {
                warn!(backend = name, error = %error, "Image backend request failed");
                Ok(None)
            }
        }
    }

    /// Write the body, then re-read the file and require it to exceed the size
    /// threshold. Undersized files are removed.
    async fn write_asset(&self, output: &Path, body: &[u8]) -> Result<Option<Vec<u8>>, PipelineError> {
        tokio::fs::write(output, body).await?;
        let written = tokio::fs::read(output).await?;
        if written.len() > self.policy.min_image_bytes {
            return Ok(Some(written));
        }

        warn!(
            path = %output.display(),
            bytes = written.len(),
            "Image file too small, discarding"
        );
        if let Err(err) = tokio::fs::remove_file(output).await {
            debug!(path = %output.display(), error = %err, "Failed to remove undersized image");
        }
        Ok(None)
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

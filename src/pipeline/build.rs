//! Wiring a [`Pipeline`] from configuration and credentials.

use std::sync::Arc;

use tracing::info;

use crate::backend::{HttpImageBackend, HttpTextBackend, ImageBackend};
use crate::config::{Credentials, ShortsmithConfig};
use crate::error::PipelineError;
use crate::generation::{BackendPool, ImageGenerator, TextGenerator};
use crate::pipeline::run::{Pipeline, RunSettings};

/// Image generator over the configured endpoint pool. Share the returned
/// generator between pipelines to share its rotation cursor.
pub fn build_image_generator(
    config: &ShortsmithConfig,
    credentials: &Credentials,
) -> Result<Arc<ImageGenerator>, PipelineError> {
    let token = credentials.require_token()?;
    let backends = HttpImageBackend::pool(&config.images.endpoints, token)?
        .into_iter()
        .map(|backend| Arc::new(backend) as Arc<dyn ImageBackend>)
        .collect();
    let pool = BackendPool::new(backends)?;
    info!(backends = pool.len(), "Image backend pool ready");
    Ok(Arc::new(ImageGenerator::new(pool, config.images.policy())))
}

pub fn build_text_generator(
    config: &ShortsmithConfig,
    credentials: &Credentials,
) -> Result<TextGenerator, PipelineError> {
    if !config.text.enabled {
        return Ok(TextGenerator::offline());
    }
    let backend = HttpTextBackend::new(
        config.text.endpoint.clone(),
        credentials.require_token()?.to_string(),
        config.text.parameters(),
        config.text.timeout(),
    )?;
    Ok(TextGenerator::new(Arc::new(backend)))
}

/// Validated configuration plus a backend token, or a configuration error
/// before any run starts.
pub fn build_pipeline(
    config: &ShortsmithConfig,
    credentials: &Credentials,
    settings: RunSettings,
) -> Result<Pipeline, PipelineError> {
    config.ensure_valid()?;
    let images = build_image_generator(config, credentials)?;
    let text = build_text_generator(config, credentials)?;
    Ok(Pipeline::new(text, images, settings))
}

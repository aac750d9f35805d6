//! Directory bundles: one self-contained folder per delivered run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::delivery::email::{EmailDraft, EmailSettings, InlineImage};
use crate::delivery::{Delivery, DeliveryReceipt};
use crate::error::PipelineError;
use crate::pipeline::RunResult;
use crate::types::TextSource;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const EMAIL_FILE: &str = "email.html";

/// Copies a run into `<root>/<topic>_youtube_shorts_<run_id>/` with its text,
/// renamed images, the email draft and a manifest.
pub struct BundleDelivery {
    root: PathBuf,
    email: EmailSettings,
}

#[derive(Debug, Serialize)]
struct BundleManifest<'a> {
    run_id: &'a str,
    topic: &'a str,
    generated_at: DateTime<Utc>,
    text_source: TextSource,
    prompt_count: usize,
    content_file: String,
    images: Vec<ManifestImage<'a>>,
    email: ManifestEmail<'a>,
}

#[derive(Debug, Serialize)]
struct ManifestImage<'a> {
    file: String,
    prompt_number: usize,
    prompt: &'a str,
    backend: &'a str,
    bytes: usize,
}

#[derive(Debug, Serialize)]
struct ManifestEmail<'a> {
    file: &'static str,
    from: Option<&'a str>,
    to: &'a [String],
    subject: &'a str,
    inline_images: &'a [InlineImage],
    /// False when no recipient is configured; the draft is kept but cannot be sent
    ready_to_send: bool,
}

impl BundleDelivery {
    pub fn new(root: impl Into<PathBuf>, email: EmailSettings) -> Self {
        Self {
            root: root.into(),
            email,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bundle_dir(&self, result: &RunResult) -> PathBuf {
        self.root.join(format!(
            "{}_youtube_shorts_{}",
            result.topic.file_stem(),
            result.run_id
        ))
    }
}

#[async_trait]
impl Delivery for BundleDelivery {
    async fn deliver(&self, result: &RunResult) -> Result<DeliveryReceipt, PipelineError> {
        let dir = self.bundle_dir(result);
        tokio::fs::create_dir_all(&dir).await?;
        let stem = result.topic.file_stem();
        let mut files = Vec::new();

        let content_name = format!("{}_content.txt", stem);
        tokio::fs::write(dir.join(&content_name), result.text.as_str()).await?;
        files.push(dir.join(&content_name));

        let mut images = Vec::with_capacity(result.images.len());
        for (i, asset) in result.images.iter().enumerate() {
            let name = format!("{}_image_{}.png", stem, i + 1);
            let target = dir.join(&name);
            tokio::fs::copy(&asset.path, &target).await.map_err(|e| {
                PipelineError::Delivery(format!(
                    "Failed to copy {}: {}",
                    asset.path.display(),
                    e
                ))
            })?;
            files.push(target);
            images.push(ManifestImage {
                file: name,
                prompt_number: asset.prompt.number(),
                prompt: &asset.prompt.description,
                backend: &asset.backend,
                bytes: asset.size(),
            });
        }

        let draft = EmailDraft::from_run(result, &self.email);
        if !draft.has_recipients() {
            warn!(run_id = %result.run_id, "No email recipients configured; bundling draft only");
        }
        tokio::fs::write(dir.join(EMAIL_FILE), &draft.html).await?;
        files.push(dir.join(EMAIL_FILE));

        let manifest = BundleManifest {
            run_id: &result.run_id,
            topic: result.topic.as_str(),
            generated_at: result.generated_at,
            text_source: result.text.source(),
            prompt_count: result.prompts.len(),
            content_file: content_name,
            images,
            email: ManifestEmail {
                file: EMAIL_FILE,
                from: draft.from.as_deref(),
                to: &draft.to,
                subject: &draft.subject,
                inline_images: &draft.inline_images,
                ready_to_send: draft.has_recipients(),
            },
        };
        tokio::fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?).await?;
        files.push(dir.join(MANIFEST_FILE));

        info!(
            bundle = %dir.display(),
            images = result.images.len(),
            recipients = draft.to.len(),
            "Run bundled"
        );

        Ok(DeliveryReceipt {
            channel: self.name().to_string(),
            location: dir,
            recipients: draft.to.clone(),
            files,
            delivered_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "bundle"
    }
}

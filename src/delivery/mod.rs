//! Delivery of finished runs, and cleanup of the files a run produced.

pub mod bundle;
pub mod email;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::pipeline::RunResult;

pub use bundle::BundleDelivery;
pub use email::{EmailDraft, EmailSettings, InlineImage};

/// Hands a successful run to its consumer.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, result: &RunResult) -> Result<DeliveryReceipt, PipelineError>;

    /// Channel name for logs and receipts
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub channel: String,
    pub location: PathBuf,
    pub recipients: Vec<String>,
    pub files: Vec<PathBuf>,
    pub delivered_at: DateTime<Utc>,
}

/// Remove a run's files and then its directory if it is empty. Best effort:
/// failures are logged and skipped. Returns the number of files removed.
pub async fn cleanup_run(result: &RunResult) -> usize {
    let mut removed = 0;
    for file in result.files() {
        match tokio::fs::remove_file(&file).await {
            Ok(()) => removed += 1,
            Err(err) => debug!(path = %file.display(), error = %err, "Cleanup skipped file"),
        }
    }
    if let Err(err) = tokio::fs::remove_dir(&result.run_dir).await {
        debug!(path = %result.run_dir.display(), error = %err, "Run directory kept");
    }
    info!(run_id = %result.run_id, removed, "Cleaned up run files");
    removed
}

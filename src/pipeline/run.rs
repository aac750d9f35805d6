//! Single-topic run: text, prompts, images, then the saved content file.
//!
//! A run always ends in exactly one terminal state. Image failures are skipped;
//! any other error, or a panic anywhere below, ends the run as `Failed` with the
//! progress reset to 0.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::generation::{extract_prompts, ImageGenerator, TextGenerator};
use crate::pipeline::state::{image_percent, RunState, RunTracker};
use crate::progress::{unique_id, ProgressSink, ProgressStore};
use crate::types::{GeneratedText, ImageAsset, ImagePrompt, Topic};

pub const BATCH_PROMPT_SUFFIX: &str =
    ", 9:16 aspect ratio, vertical orientation, cinematic quality, vibrant colors";
pub const INTERACTIVE_PROMPT_SUFFIX: &str =
    ", 9:16 aspect ratio, vertical orientation, YouTube Shorts style";
pub const INTERACTIVE_MAX_IMAGES: usize = 3;

/// How a run is invoked: one-shot batch (every prompt) or interactive (capped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunProfile {
    Batch,
    Interactive,
}

impl RunProfile {
    pub fn max_images(self) -> Option<usize> {
        match self {
            RunProfile::Batch => None,
            RunProfile::Interactive => Some(INTERACTIVE_MAX_IMAGES),
        }
    }

    pub fn prompt_suffix(self) -> &'static str {
        match self {
            RunProfile::Batch => BATCH_PROMPT_SUFFIX,
            RunProfile::Interactive => INTERACTIVE_PROMPT_SUFFIX,
        }
    }

    /// Pause between image prompts.
    pub fn image_cooldown(self) -> Duration {
        match self {
            RunProfile::Batch => Duration::from_secs(3),
            RunProfile::Interactive => Duration::from_secs(2),
        }
    }
}

/// Per-run knobs, usually derived from a [`RunProfile`] plus configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// `None` generates an image for every prompt
    pub max_images: Option<usize>,
    pub prompt_suffix: String,
    pub image_cooldown: Duration,
    /// Each run writes into `output_dir/<run_id>/`
    pub output_dir: PathBuf,
}

impl RunSettings {
    pub fn for_profile(profile: RunProfile, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_images: profile.max_images(),
            prompt_suffix: profile.prompt_suffix().to_string(),
            image_cooldown: profile.image_cooldown(),
            output_dir: output_dir.into(),
        }
    }

    /// Prompts this run will generate images for, in extraction order.
    pub fn select<'p>(&self, prompts: &'p [ImagePrompt]) -> &'p [ImagePrompt] {
        let cap = self.max_images.unwrap_or(prompts.len()).min(prompts.len());
        &prompts[..cap]
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: String,
    pub topic: Topic,
    pub text: GeneratedText,
    /// Every extracted prompt, including ones past the image cap
    pub prompts: Vec<ImagePrompt>,
    /// Produced images in prompt order; may be shorter than `prompts`
    pub images: Vec<ImageAsset>,
    pub run_dir: PathBuf,
    pub content_file: PathBuf,
    pub generated_at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
}

impl RunResult {
    /// Every file the run wrote: images, then the content file.
    pub fn files(&self) -> Vec<PathBuf> {
        self.images
            .iter()
            .map(|asset| asset.path.clone())
            .chain(std::iter::once(self.content_file.clone()))
            .collect()
    }
}

/// Terminal state of a run. A failed run keeps no partial result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunOutcome {
    Done(RunResult),
    Failed { error: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Done(_))
    }

    pub fn result(&self) -> Option<&RunResult> {
        match self {
            RunOutcome::Done(result) => Some(result),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RunOutcome::Done(_) => None,
            RunOutcome::Failed { error } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<RunResult, PipelineError> {
        match self {
            RunOutcome::Done(result) => Ok(result),
            RunOutcome::Failed { error } => Err(PipelineError::RunFailed(error)),
        }
    }

    /// Drop in-memory image bytes, keeping paths and sizes.
    pub fn release_image_data(&mut self) {
        if let RunOutcome::Done(result) = self {
            for asset in &mut result.images {
                asset.data = Vec::new();
            }
        }
    }
}

/// Orchestrates runs. One pipeline may serve many concurrent runs; they share
/// only the image generator and its rotation cursor.
pub struct Pipeline {
    text: TextGenerator,
    images: Arc<ImageGenerator>,
    settings: RunSettings,
}

impl Pipeline {
    pub fn new(text: TextGenerator, images: Arc<ImageGenerator>, settings: RunSettings) -> Self {
        Self {
            text,
            images,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn images(&self) -> &Arc<ImageGenerator> {
        &self.images
    }

    /// Run a topic to a terminal state, reporting to `progress`.
    pub async fn run(&self, topic: &Topic, progress: &dyn ProgressSink) -> RunOutcome {
        let mut tracker = RunTracker::new(progress);
        let attempt = AssertUnwindSafe(self.execute(topic, &mut tracker))
            .catch_unwind()
            .await;

        let error = match attempt {
            Ok(Ok(result)) => return RunOutcome::Done(result),
            Ok(Err(err)) => err.to_string(),
            Err(payload) => PipelineError::Panicked(panic_message(payload)).to_string(),
        };

        error!(topic = %topic, error = %error, "Run failed");
        tracker.fail(&format!("❌ Error: {}", error));
        RunOutcome::Failed { error }
    }

    /// Run on a tokio task. The pipeline is shared, the sink is owned by the task.
    pub fn spawn(
        self: &Arc<Self>,
        topic: Topic,
        progress: Arc<dyn ProgressSink>,
    ) -> JoinHandle<RunOutcome> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.run(&topic, progress.as_ref()).await })
    }

    /// Open a session in `store`, run in the background and record the outcome
    /// there. Returns the session id to poll.
    pub fn start_session(self: &Arc<Self>, store: &Arc<ProgressStore>, topic: Topic) -> String {
        let session_id = store.open_session(topic.as_str());
        let sink = store.sink(&session_id);
        let store = Arc::clone(store);
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = pipeline.run(&topic, &sink).await;
            store.finish(sink.session_id(), outcome);
        });
        session_id
    }

    async fn execute(
        &self,
        topic: &Topic,
        tracker: &mut RunTracker<'_>,
    ) -> Result<RunResult, PipelineError> {
        let run_id = unique_id("run");
        let run_dir = self.settings.output_dir.join(&run_id);
        info!(topic = %topic, run_id = %run_id, "Starting run");
        tracker.start(&format!("Starting content generation for: {}", topic));

        tracker.advance(RunState::GeneratingText, "Generating YouTube Shorts script...");
        let text = self.text.generate(topic).await;

        tracker.advance(RunState::ExtractingPrompts, "Extracting image prompts...");
        let prompts = extract_prompts(text.as_str());
        info!(run_id = %run_id, prompts = prompts.len(), "Extracted image prompts");

        tracker.advance(RunState::GeneratingImages, "Generating images...");
        tokio::fs::create_dir_all(&run_dir).await?;
        let images = self.generate_images(&prompts, &run_dir, tracker).await?;

        tracker.advance(RunState::Finalizing, "Saving content...");
        let content_file = run_dir.join(format!("content_{}.txt", Utc::now().timestamp()));
        tokio::fs::write(&content_file, text.as_str()).await?;

        info!(
            run_id = %run_id,
            images = images.len(),
            prompts = prompts.len(),
            "Run complete"
        );
        let result = RunResult {
            run_id,
            topic: topic.clone(),
            text,
            prompts,
            images,
            run_dir,
            content_file,
            generated_at: Utc::now(),
            success: true,
            error: None,
        };
        tracker.advance(
            RunState::Done,
            &format!("✅ Successfully generated content for '{}'!", topic),
        );
        Ok(result)
    }

    /// One image per selected prompt. A prompt whose backends all fail is skipped.
    async fn generate_images(
        &self,
        prompts: &[ImagePrompt],
        run_dir: &Path,
        tracker: &mut RunTracker<'_>,
    ) -> Result<Vec<ImageAsset>, PipelineError> {
        let selected = self.settings.select(prompts);
        let total = selected.len();
        let mut assets = Vec::with_capacity(total);

        for prompt in selected {
            let number = prompt.number();
            tracker.step(
                image_percent(number, total),
                &format!("Generating image {}/{}...", number, total),
            );

            let enhanced = format!("{}{}", prompt.description, self.settings.prompt_suffix);
            let path = run_dir.join(format!(
                "youtube_shorts_image_{}_{}.png",
                number,
                Utc::now().timestamp()
            ));

            match self.images.generate(&enhanced, &path).await? {
                Some(image) => assets.push(ImageAsset {
                    prompt: prompt.clone(),
                    path,
                    backend: image.backend,
                    bytes: image.data.len(),
                    data: image.data,
                }),
                None => warn!(prompt = number, "Skipping prompt, no image produced"),
            }

            if number < total && !self.settings.image_cooldown.is_zero() {
                tokio::time::sleep(self.settings.image_cooldown).await;
            }
        }

        Ok(assets)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

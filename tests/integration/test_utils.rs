//! Shared test utilities for integration tests
//!
//! Scripted in-process backends plus environment isolation for tests that load
//! configuration (which reads `XDG_CONFIG_HOME`, `HOME` and `SHORTSMITH_*`).

use async_trait::async_trait;
use parking_lot::Mutex as PlMutex;
use shortsmith::backend::{BackendResponse, ImageBackend, TextBackend};
use shortsmith::generation::{BackendPool, ImageGenerator, ImagePolicy, TextGenerator};
use shortsmith::pipeline::{Pipeline, RunProfile, RunSettings};
use shortsmith::BackendError;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "SHORTSMITH_ENV",
    "SHORTSMITH__RUN__MAX_IMAGES",
    "SHORTSMITH__IMAGES__ENDPOINTS",
    "SHORTSMITH__IMAGES__TIMEOUT_SECS",
];

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and the
/// shortsmith variables cleared, restoring everything afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|key| (*key, std::env::var(key).ok()))
        .collect();

    for key in ISOLATED_VARS {
        std::env::remove_var(key);
    }
    let home = test_dir.path().join("home");
    let config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// One scripted reply of an image backend.
#[derive(Clone)]
pub enum Reply {
    Image(usize),
    Status(u16),
    Timeout,
}

/// Image backend answering from a script; the last reply repeats once the
/// script runs out.
pub struct ScriptedImages {
    name: String,
    replies: PlMutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
    pub prompts: PlMutex<Vec<String>>,
}

impl ScriptedImages {
    pub fn always(name: &str, reply: Reply) -> Arc<Self> {
        Self::script(name, Vec::new(), reply)
    }

    pub fn script(name: &str, replies: Vec<Reply>, then: Reply) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: PlMutex::new(replies.into()),
            fallback: then,
            calls: AtomicUsize::new(0),
            prompts: PlMutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageBackend for ScriptedImages {
    async fn generate(
        &self,
        prompt: &str,
        _timeout: Duration,
    ) -> Result<BackendResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Image(bytes) => Ok(BackendResponse::new(
                200,
                Some("image/png"),
                vec![0x89; bytes],
            )),
            Reply::Status(status) => Ok(BackendResponse::new(
                status,
                Some("application/json"),
                br#"{"error":"busy"}"#.to_vec(),
            )),
            Reply::Timeout => Err(BackendError::Timeout("scripted".to_string())),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Text backend that always fails, forcing the offline script.
pub struct DownText;

#[async_trait]
impl TextBackend for DownText {
    async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
        Err(BackendError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        "down"
    }
}

/// Text backend returning a fixed script.
pub struct FixedText(pub String);

#[async_trait]
impl TextBackend for FixedText {
    async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

pub fn fast_policy() -> ImagePolicy {
    ImagePolicy {
        attempt_timeout: Duration::from_secs(1),
        retry_delay: Duration::ZERO,
        min_image_bytes: 1000,
    }
}

pub fn image_generator(backends: Vec<Arc<dyn ImageBackend>>) -> Arc<ImageGenerator> {
    Arc::new(ImageGenerator::new(
        BackendPool::new(backends).unwrap(),
        fast_policy(),
    ))
}

/// Batch settings writing under `dir`, without the cooldown.
pub fn batch_settings(dir: &Path) -> RunSettings {
    let mut settings = RunSettings::for_profile(RunProfile::Batch, dir.join("generated"));
    settings.image_cooldown = Duration::ZERO;
    settings
}

pub fn pipeline(
    text: Arc<dyn TextBackend>,
    images: Arc<ImageGenerator>,
    settings: RunSettings,
) -> Pipeline {
    Pipeline::new(TextGenerator::new(text), images, settings)
}

//! Configuration System
//!
//! Layered TOML configuration for backends, runs and delivery, with
//! `SHORTSMITH__SECTION__KEY` environment overrides and validation that reports
//! every problem at once. Credentials live outside the config files, in the
//! environment (optionally loaded from `.env`).

use crate::backend::TextParameters;
use crate::generation::ImagePolicy;
use crate::logging::LoggingConfig;
use crate::pipeline::{RunProfile, RunSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod credentials;
mod facade;
mod merge;
mod sources;

pub use credentials::{
    load_dotenv, mask_secret, CredentialStatus, Credentials, HUGGING_FACE_TOKEN, RECIPIENT_EMAIL,
    RECIPIENT_EMAILS, SENDER_APP_PASSWORD, SENDER_EMAIL,
};
pub use facade::ConfigLoader;

pub const DEFAULT_TEXT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/microsoft/DialoGPT-medium";

/// Hosted image models tried in rotation, in this order.
pub const DEFAULT_IMAGE_ENDPOINTS: &[&str] = &[
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-schnell",
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-dev",
    "https://api-inference.huggingface.co/models/runwayml/stable-diffusion-v1-5",
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2-1",
    "https://api-inference.huggingface.co/models/CompVis/stable-diffusion-v1-4",
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0",
    "https://api-inference.huggingface.co/models/prompthero/openjourney-v4",
    "https://api-inference.huggingface.co/models/wavymulder/Analog-Diffusion",
    "https://api-inference.huggingface.co/models/nitrosocke/Ghibli-Diffusion",
    "https://api-inference.huggingface.co/models/hakurei/waifu-diffusion",
    "https://api-inference.huggingface.co/models/andite/anything-v4.0",
];

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortsmithConfig {
    #[serde(default)]
    pub text: TextConfig,

    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Text backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// When false, runs use the fallback script without calling the backend
    pub enabled: bool,
    pub endpoint: String,
    pub max_length: u32,
    pub temperature: f32,
    pub do_sample: bool,
    pub timeout_secs: u64,
}

impl Default for TextConfig {
    fn default() -> Self {
        let parameters = TextParameters::default();
        Self {
            enabled: true,
            endpoint: DEFAULT_TEXT_ENDPOINT.to_string(),
            max_length: parameters.max_length,
            temperature: parameters.temperature,
            do_sample: parameters.do_sample,
            timeout_secs: 60,
        }
    }
}

impl TextConfig {
    pub fn parameters(&self) -> TextParameters {
        TextParameters {
            max_length: self.max_length,
            temperature: self.temperature,
            do_sample: self.do_sample,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Image backend pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Ordered pool; rotation starts at the first entry
    pub endpoints: Vec<String>,
    pub timeout_secs: u64,
    pub retry_delay_ms: u64,
    /// Responses must be strictly larger than this to count as images
    pub min_image_bytes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let policy = ImagePolicy::default();
        Self {
            endpoints: DEFAULT_IMAGE_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            timeout_secs: policy.attempt_timeout.as_secs(),
            retry_delay_ms: policy.retry_delay.as_millis() as u64,
            min_image_bytes: policy.min_image_bytes,
        }
    }
}

impl ImageConfig {
    pub fn policy(&self) -> ImagePolicy {
        ImagePolicy {
            attempt_timeout: Duration::from_secs(self.timeout_secs),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            min_image_bytes: self.min_image_bytes,
        }
    }
}

/// Per-run settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Image cap for batch runs; unset means every prompt
    pub max_images: Option<usize>,
    pub interactive_max_images: usize,
    /// Replaces the profile's style suffix when set
    pub prompt_suffix: Option<String>,
    pub output_dir: PathBuf,
    /// Replaces the profile's pause between image prompts when set
    pub image_cooldown_ms: Option<u64>,
    /// Keep generated files after delivery
    pub keep_files: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_images: None,
            interactive_max_images: crate::pipeline::INTERACTIVE_MAX_IMAGES,
            prompt_suffix: None,
            output_dir: PathBuf::from("generated"),
            image_cooldown_ms: None,
            keep_files: false,
        }
    }
}

impl RunConfig {
    /// Profile defaults with this configuration applied on top.
    pub fn settings(&self, profile: RunProfile) -> RunSettings {
        let mut settings = RunSettings::for_profile(profile, self.output_dir.clone());
        settings.max_images = match profile {
            RunProfile::Batch => self.max_images,
            RunProfile::Interactive => Some(self.interactive_max_images),
        };
        if let Some(suffix) = &self.prompt_suffix {
            settings.prompt_suffix = suffix.clone();
        }
        if let Some(ms) = self.image_cooldown_ms {
            settings.image_cooldown = Duration::from_millis(ms);
        }
        settings
    }
}

/// Delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Falls back to `SENDER_EMAIL`
    pub sender: Option<String>,
    /// Falls back to `RECIPIENT_EMAILS` / `RECIPIENT_EMAIL`
    pub recipients: Vec<String>,
    pub subject_prefix: String,
    /// Where bundles are written
    pub bundle_dir: PathBuf,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            sender: None,
            recipients: Vec::new(),
            subject_prefix: "YouTube Shorts Content".to_string(),
            bundle_dir: PathBuf::from("bundles"),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Text(String),
    Images(String),
    Run(String),
    Delivery(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Text(msg) => write!(f, "text: {}", msg),
            ValidationError::Images(msg) => write!(f, "images: {}", msg),
            ValidationError::Run(msg) => write!(f, "run: {}", msg),
            ValidationError::Delivery(msg) => write!(f, "delivery: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl ShortsmithConfig {
    /// Validate the entire configuration, collecting every violation.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.text.enabled {
            if !is_http_url(&self.text.endpoint) {
                errors.push(ValidationError::Text(format!(
                    "endpoint '{}' is not an http(s) URL",
                    self.text.endpoint
                )));
            }
            if self.text.timeout_secs == 0 {
                errors.push(ValidationError::Text("timeout_secs must be positive".to_string()));
            }
        }

        if self.images.endpoints.is_empty() {
            errors.push(ValidationError::Images("Image backend pool is empty".to_string()));
        }
        for endpoint in &self.images.endpoints {
            if !is_http_url(endpoint) {
                errors.push(ValidationError::Images(format!(
                    "endpoint '{}' is not an http(s) URL",
                    endpoint
                )));
            }
        }
        if self.images.timeout_secs == 0 {
            errors.push(ValidationError::Images("timeout_secs must be positive".to_string()));
        }
        if self.images.min_image_bytes == 0 {
            errors.push(ValidationError::Images(
                "min_image_bytes must be positive".to_string(),
            ));
        }

        if self.run.max_images == Some(0) {
            errors.push(ValidationError::Run("max_images must be at least 1".to_string()));
        }
        if self.run.interactive_max_images == 0 {
            errors.push(ValidationError::Run(
                "interactive_max_images must be at least 1".to_string(),
            ));
        }
        if self.run.output_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Run("output_dir cannot be empty".to_string()));
        }

        for recipient in &self.delivery.recipients {
            if !recipient.contains('@') {
                errors.push(ValidationError::Delivery(format!(
                    "recipient '{}' is not an email address",
                    recipient
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validation result folded into a single configuration error.
    pub fn ensure_valid(&self) -> Result<(), crate::error::PipelineError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            crate::error::PipelineError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }
}

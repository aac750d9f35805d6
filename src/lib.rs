//! shortsmith: YouTube Shorts content generation
//!
//! Turns a topic into a short-video script, extracts the image prompts embedded
//! in it and renders each prompt through a rotating pool of hosted image
//! models, reporting progress as the run moves through its states.

pub mod backend;
pub mod cli;
pub mod config;
pub mod content;
pub mod delivery;
pub mod error;
pub mod generation;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod types;

pub use error::{BackendError, PipelineError};
pub use pipeline::{Pipeline, RunOutcome, RunResult};
pub use types::{GeneratedText, ImageAsset, ImagePrompt, Topic};

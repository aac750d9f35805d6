//! Run orchestration.

pub mod build;
pub mod run;
pub mod state;

pub use build::{build_image_generator, build_pipeline, build_text_generator};
pub use run::{
    Pipeline, RunOutcome, RunProfile, RunResult, RunSettings, BATCH_PROMPT_SUFFIX,
    INTERACTIVE_MAX_IMAGES, INTERACTIVE_PROMPT_SUFFIX,
};
pub use state::{image_percent, RunState, RunTracker, START_PERCENT};

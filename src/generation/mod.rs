//! Content generation stages: script text, prompt extraction, images.

pub mod image;
pub mod prompts;
pub mod text;

pub use image::{
    is_image_like, AttemptOutcome, BackendPool, GeneratedImage, ImageGenerator, ImagePolicy,
};
pub use prompts::{extract_prompts, strip_markers};
pub use text::{fallback_script, instruction_prompt, TextGenerator, FALLBACK_IMAGE_PROMPTS};

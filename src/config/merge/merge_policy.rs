//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key. Lists (such as `images.endpoints`) are left to
//! serde defaults so a file that sets a list replaces it instead of merging by index.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

use crate::config::DEFAULT_TEXT_ENDPOINT;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("text.endpoint", DEFAULT_TEXT_ENDPOINT)?
        .set_default("run.output_dir", "generated")?
        .set_default("delivery.subject_prefix", "YouTube Shorts Content")
}

//! Config loading facade: builds the layered source stack and deserializes it.

use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::merge::merge_policy::builder_with_defaults;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::ShortsmithConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (highest last): defaults, global file, `config/config.toml`,
    /// `config/{SHORTSMITH_ENV}.toml`, `SHORTSMITH__*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ShortsmithConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: ShortsmithConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from one explicit file, which replaces the file layers.
    /// Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<ShortsmithConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load from `config_file` when given, otherwise from the workspace layers.
    pub fn resolve(
        workspace_root: &Path,
        config_file: Option<&Path>,
    ) -> Result<ShortsmithConfig, ConfigError> {
        match config_file {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

//! Integration tests for Configuration System

use crate::integration::test_utils::with_isolated_env;
use shortsmith::config::{ConfigLoader, ShortsmithConfig, DEFAULT_IMAGE_ENDPOINTS};
use shortsmith::pipeline::RunProfile;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_loads_backends_and_run_settings() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("shortsmith.toml");
    std::fs::write(
        &config_file,
        r#"
[text]
enabled = false

[images]
endpoints = [
    "https://models.example/a",
    "https://models.example/b",
]
timeout_secs = 30
retry_delay_ms = 500

[run]
max_images = 4
prompt_suffix = ", watercolor"
image_cooldown_ms = 0
output_dir = "out"

[delivery]
recipients = ["team@example.com"]
"#,
    )
    .unwrap();

    let config = with_isolated_env(&temp_dir, || ConfigLoader::load_from_file(&config_file))
        .unwrap();
    assert!(config.validate().is_ok());
    assert!(!config.text.enabled);
    assert_eq!(config.images.endpoints.len(), 2);

    let policy = config.images.policy();
    assert_eq!(policy.attempt_timeout, Duration::from_secs(30));
    assert_eq!(policy.retry_delay, Duration::from_millis(500));
    assert_eq!(policy.min_image_bytes, 1000);

    let batch = config.run.settings(RunProfile::Batch);
    assert_eq!(batch.max_images, Some(4));
    assert_eq!(batch.prompt_suffix, ", watercolor");
    assert_eq!(batch.image_cooldown, Duration::ZERO);

    let interactive = config.run.settings(RunProfile::Interactive);
    assert_eq!(interactive.max_images, Some(3));
}

#[test]
fn test_config_validation_collects_every_error() {
    let mut config = ShortsmithConfig::default();
    config.images.endpoints.clear();
    config.images.min_image_bytes = 0;
    config.run.max_images = Some(0);
    config.delivery.recipients = vec!["not-an-address".to_string()];

    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 4);
    let rendered = config.ensure_valid().unwrap_err().to_string();
    assert!(rendered.contains("pool is empty"));
    assert!(rendered.contains("not-an-address"));
}

#[test]
fn test_config_default_values() {
    let config = ShortsmithConfig::default();
    assert!(config.text.enabled);
    assert_eq!(config.images.endpoints.len(), DEFAULT_IMAGE_ENDPOINTS.len());
    assert_eq!(config.images.timeout_secs, 60);
    assert_eq!(config.images.retry_delay_ms, 2000);
    assert_eq!(config.run.max_images, None);
    assert_eq!(config.run.interactive_max_images, 3);
    assert_eq!(config.delivery.subject_prefix, "YouTube Shorts Content");
    assert!(config.validate().is_ok());
}

#[test]
fn test_workspace_file_overrides_global_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();

    let config = with_isolated_env(&temp_dir, || {
        let global = temp_dir.path().join("xdg").join("shortsmith");
        std::fs::create_dir_all(&global).unwrap();
        std::fs::write(
            global.join("config.toml"),
            "[run]\nmax_images = 9\noutput_dir = \"global-out\"\n",
        )
        .unwrap();
        std::fs::write(
            workspace.join("config").join("config.toml"),
            "[run]\nmax_images = 2\n",
        )
        .unwrap();
        ConfigLoader::load(&workspace)
    })
    .unwrap();

    assert_eq!(config.run.max_images, Some(2));
    assert_eq!(config.run.output_dir, std::path::PathBuf::from("global-out"));
}

#[test]
fn test_environment_overrides_files_and_parses_lists() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();
    std::fs::write(
        workspace.join("config").join("config.toml"),
        "[run]\nmax_images = 2\n",
    )
    .unwrap();

    let config = with_isolated_env(&temp_dir, || {
        std::env::set_var("SHORTSMITH__RUN__MAX_IMAGES", "5");
        std::env::set_var(
            "SHORTSMITH__IMAGES__ENDPOINTS",
            "https://one.example/m,https://two.example/m",
        );
        ConfigLoader::load(&workspace)
    })
    .unwrap();

    assert_eq!(config.run.max_images, Some(5));
    assert_eq!(
        config.images.endpoints,
        vec!["https://one.example/m", "https://two.example/m"]
    );
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");
    let result = with_isolated_env(&temp_dir, || ConfigLoader::load_from_file(&missing));
    assert!(result.is_err());
}

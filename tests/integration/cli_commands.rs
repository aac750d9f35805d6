//! Integration tests for CLI commands routed through RunContext

use shortsmith::cli::{Commands, OutputFormat, RunContext};
use shortsmith::config::{Credentials, ShortsmithConfig};
use std::path::PathBuf;
use tempfile::TempDir;

fn context(workspace: &TempDir, server_url: &str) -> RunContext {
    let mut config = ShortsmithConfig::default();
    config.text.enabled = false;
    config.images.endpoints = vec![format!("{}/models/painter", server_url)];
    config.images.retry_delay_ms = 0;
    config.run.image_cooldown_ms = Some(0);

    RunContext::with_parts(
        workspace.path().to_path_buf(),
        None,
        None,
        config,
        Credentials {
            hugging_face_token: Some("hf_cli_token".to_string()),
            ..Credentials::default()
        },
    )
}

fn generate(keep: bool) -> Commands {
    Commands::Generate {
        topic: Some("Deep Sea".to_string()),
        max_images: Some(2),
        output: None,
        bundle_dir: None,
        interactive: false,
        keep,
        format: OutputFormat::Json,
    }
}

#[test]
fn test_generate_bundles_and_cleans_up() {
    let mut server = mockito::Server::new();
    let painter = server
        .mock("POST", "/models/painter")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![7u8; 2048])
        .expect(2)
        .create();
    let workspace = TempDir::new().unwrap();

    let output = context(&workspace, &server.url())
        .execute(&generate(false))
        .unwrap();
    painter.assert();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["result"]["topic"], "Deep Sea");
    assert_eq!(value["result"]["images"].as_array().unwrap().len(), 2);
    assert_eq!(value["kept"], false);

    let percents: Vec<u64> = value["progress"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["percent"].as_u64().unwrap())
        .collect();
    assert_eq!(percents.first(), Some(&10));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));

    let bundle = PathBuf::from(value["delivery"]["location"].as_str().unwrap());
    assert!(bundle.starts_with(workspace.path().join("bundles")));
    assert!(bundle.join("Deep_Sea_image_2.png").exists());

    let run_dir = PathBuf::from(value["result"]["run_dir"].as_str().unwrap());
    assert!(run_dir.starts_with(workspace.path().join("generated")));
    assert!(!run_dir.exists());
}

#[test]
fn test_generate_keep_leaves_run_files() {
    let mut server = mockito::Server::new();
    let _painter = server
        .mock("POST", "/models/painter")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![7u8; 2048])
        .create();
    let workspace = TempDir::new().unwrap();

    let output = context(&workspace, &server.url())
        .execute(&generate(true))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let run_dir = PathBuf::from(value["result"]["run_dir"].as_str().unwrap());
    assert!(run_dir.exists());
    assert_eq!(std::fs::read_dir(run_dir).unwrap().count(), 3);
}

#[test]
fn test_generate_with_unreachable_backend_still_delivers_text() {
    let workspace = TempDir::new().unwrap();
    // nothing listens on port 9; every image attempt is a connection error
    let output = context(&workspace, "http://127.0.0.1:9")
        .execute(&Commands::Generate {
            topic: Some("Quiet".to_string()),
            max_images: Some(1),
            output: Some(workspace.path().join("elsewhere")),
            bundle_dir: None,
            interactive: false,
            keep: true,
            format: OutputFormat::Text,
        })
        .unwrap();

    assert!(output.contains("Successfully generated content for 'Quiet'"));
    assert!(output.contains("Images: 0 of 7 prompts"));
    assert!(workspace.path().join("elsewhere").exists());
}

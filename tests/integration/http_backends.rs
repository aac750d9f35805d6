//! End-to-end runs against mock HTTP backends

use shortsmith::config::{Credentials, ShortsmithConfig};
use shortsmith::pipeline::{build_pipeline, RunProfile};
use shortsmith::progress::ProgressLog;
use shortsmith::types::{TextSource, Topic};
use tempfile::TempDir;

fn credentials() -> Credentials {
    Credentials {
        hugging_face_token: Some("hf_test_token".to_string()),
        ..Credentials::default()
    }
}

fn config_for(server_url: &str, dir: &TempDir) -> ShortsmithConfig {
    let mut config = ShortsmithConfig::default();
    config.text.endpoint = format!("{}/models/writer", server_url);
    config.images.endpoints = vec![
        format!("{}/models/loading", server_url),
        format!("{}/models/painter", server_url),
    ];
    config.images.retry_delay_ms = 0;
    config.run.image_cooldown_ms = Some(0);
    config.run.output_dir = dir.path().join("generated");
    config
}

#[tokio::test]
async fn test_run_over_http_rotates_past_loading_model() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&server.url(), &dir);

    let script = "Hook about owls\n[IMAGE_PROMPT: an owl at night]\nFact\n[IMAGE_PROMPT: owl eyes close-up]\n🎬 YOUTUBE SHORTS TITLE:\nOwls!";
    let text_mock = server
        .mock("POST", "/models/writer")
        .match_header("authorization", "Bearer hf_test_token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::json!([{ "generated_text": script }]).to_string())
        .expect(1)
        .create_async()
        .await;
    let loading = server
        .mock("POST", "/models/loading")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Model is currently loading","estimated_time":20.0}"#)
        .expect(2)
        .create_async()
        .await;
    let painter = server
        .mock("POST", "/models/painter")
        .match_header("authorization", "Bearer hf_test_token")
        .with_status(200)
        .with_header("content-type", "image/jpeg")
        .with_body(vec![0xFFu8; 1500])
        .expect(2)
        .create_async()
        .await;

    let settings = config.run.settings(RunProfile::Batch);
    let pipeline = build_pipeline(&config, &credentials(), settings).unwrap();
    let log = ProgressLog::new();
    let outcome = pipeline.run(&Topic::new("Owls").unwrap(), &log).await;

    let result = outcome.into_result().unwrap();
    assert_eq!(result.text.source(), TextSource::Backend);
    assert_eq!(result.prompts.len(), 2);
    assert_eq!(result.images.len(), 2);
    assert!(result.images.iter().all(|a| a.backend == "painter"));
    assert_eq!(log.percents(), vec![10, 25, 40, 50, 65, 80, 90, 100]);

    text_mock.assert_async().await;
    loading.assert_async().await;
    painter.assert_async().await;
}

#[tokio::test]
async fn test_text_failure_falls_back_and_cap_applies() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server.url(), &dir);
    config.run.interactive_max_images = 2;

    let _text = server
        .mock("POST", "/models/writer")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;
    let _loading = server
        .mock("POST", "/models/loading")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![1u8; 4096])
        .create_async()
        .await;
    let painter = server
        .mock("POST", "/models/painter")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(vec![2u8; 4096])
        .expect(1)
        .create_async()
        .await;

    let settings = config.run.settings(RunProfile::Interactive);
    let pipeline = build_pipeline(&config, &credentials(), settings).unwrap();
    let result = pipeline
        .run(&Topic::new("Rainforests").unwrap(), &ProgressLog::new())
        .await
        .into_result()
        .unwrap();

    assert!(result.text.is_fallback());
    assert_eq!(result.prompts.len(), 7);
    assert_eq!(result.images.len(), 2);
    // rotation continues across prompts: first prompt on one model, second on the next
    assert_eq!(result.images[0].backend, "loading");
    assert_eq!(result.images[1].backend, "painter");
    assert_eq!(pipeline.images().pool().cursor(), 0);
    painter.assert_async().await;
}

#[tokio::test]
async fn test_garbage_success_body_is_not_an_image() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server.url(), &dir);
    config.text.enabled = false;

    let _loading = server
        .mock("POST", "/models/loading")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;
    let _painter = server
        .mock("POST", "/models/painter")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let mut settings = config.run.settings(RunProfile::Batch);
    settings.max_images = Some(1);
    let pipeline = build_pipeline(&config, &credentials(), settings).unwrap();
    let result = pipeline
        .run(&Topic::new("Mirage").unwrap(), &ProgressLog::new())
        .await
        .into_result()
        .unwrap();

    assert!(result.images.is_empty());
    assert!(result.success);
}

//! Integration tests for whole pipeline runs over scripted backends

use crate::integration::test_utils::{
    batch_settings, image_generator, pipeline, DownText, FixedText, Reply, ScriptedImages,
};
use shortsmith::backend::ImageBackend;
use shortsmith::generation::FALLBACK_IMAGE_PROMPTS;
use shortsmith::pipeline::{RunOutcome, BATCH_PROMPT_SUFFIX};
use shortsmith::progress::{ProgressLog, ProgressStore, PrunePolicy, SessionStatus};
use shortsmith::types::{TextSource, Topic};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_black_holes_with_text_down_and_one_slow_backend() {
    let dir = TempDir::new().unwrap();
    let slow = ScriptedImages::always("slow", Reply::Timeout);
    let good = ScriptedImages::always("good", Reply::Image(1500));
    let images = image_generator(vec![
        slow.clone() as Arc<dyn ImageBackend>,
        good.clone() as Arc<dyn ImageBackend>,
    ]);
    let pipeline = pipeline(Arc::new(DownText), images, batch_settings(dir.path()));
    let log = ProgressLog::new();

    let outcome = pipeline.run(&Topic::new("Black Holes").unwrap(), &log).await;
    let result = outcome.result().expect("run should succeed");

    assert_eq!(result.text.source(), TextSource::Fallback);
    assert_eq!(result.prompts.len(), FALLBACK_IMAGE_PROMPTS);
    assert_eq!(result.images.len(), 7);
    for (i, asset) in result.images.iter().enumerate() {
        assert_eq!(asset.prompt.number(), i + 1);
        assert_eq!(asset.backend, "good");
        assert_eq!(std::fs::metadata(&asset.path).unwrap().len(), 1500);
    }
    // every prompt hits the timeout first, then the good backend
    assert_eq!(slow.calls(), 7);
    assert_eq!(good.calls(), 7);
    assert!(good
        .prompts
        .lock()
        .iter()
        .all(|p| p.ends_with(BATCH_PROMPT_SUFFIX)));

    assert_eq!(log.last().unwrap().percent, 100);
    let percents = log.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(&percents[..4], &[10, 25, 40, 50]);
    assert!(result.content_file.exists());
}

#[tokio::test]
async fn test_all_backends_down_still_completes() {
    let dir = TempDir::new().unwrap();
    let busy = ScriptedImages::always("busy", Reply::Status(503));
    let limited = ScriptedImages::always("limited", Reply::Status(429));
    let images = image_generator(vec![
        busy.clone() as Arc<dyn ImageBackend>,
        limited.clone() as Arc<dyn ImageBackend>,
    ]);
    let script = "Hook\n[IMAGE_PROMPT: one]\n[IMAGE_PROMPT: two]".to_string();
    let pipeline = pipeline(Arc::new(FixedText(script)), images, batch_settings(dir.path()));
    let log = ProgressLog::new();

    let outcome = pipeline.run(&Topic::new("Tides").unwrap(), &log).await;
    let result = outcome.result().unwrap();

    assert_eq!(result.prompts.len(), 2);
    assert!(result.images.is_empty());
    assert_eq!(busy.calls() + limited.calls(), 4);
    assert_eq!(log.percents(), vec![10, 25, 40, 50, 65, 80, 90, 100]);
}

#[tokio::test]
async fn test_tiny_payloads_are_rejected() {
    let dir = TempDir::new().unwrap();
    // exactly at the threshold is not enough
    let tiny = ScriptedImages::always("tiny", Reply::Image(1000));
    let images = image_generator(vec![tiny as Arc<dyn ImageBackend>]);
    let script = "[IMAGE_PROMPT: speck]".to_string();
    let pipeline = pipeline(Arc::new(FixedText(script)), images, batch_settings(dir.path()));

    let outcome = pipeline.run(&Topic::new("Dust").unwrap(), &ProgressLog::new()).await;
    let result = outcome.result().unwrap();
    assert!(result.images.is_empty());
    assert_eq!(std::fs::read_dir(&result.run_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let dir = TempDir::new().unwrap();
    let flaky = ScriptedImages::script(
        "flaky",
        vec![Reply::Status(503), Reply::Image(2000)],
        Reply::Image(2000),
    );
    let steady = ScriptedImages::always("steady", Reply::Image(2000));
    let images = image_generator(vec![
        flaky as Arc<dyn ImageBackend>,
        steady as Arc<dyn ImageBackend>,
    ]);
    let pipeline = Arc::new(pipeline(Arc::new(DownText), images, batch_settings(dir.path())));
    let store = Arc::new(ProgressStore::new());

    let first = pipeline.start_session(&store, Topic::new("Comets").unwrap());
    let second = pipeline.start_session(&store, Topic::new("Glaciers").unwrap());
    assert_ne!(first, second);

    for _ in 0..200 {
        let done = [&first, &second].iter().all(|id| {
            store
                .get_session(id)
                .map(|record| record.status.is_finished())
                .unwrap_or(false)
        });
        if done {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for id in [&first, &second] {
        let record = store.get_session(id).unwrap();
        assert_eq!(record.status, SessionStatus::Completed);
        assert_eq!(store.status(id).progress, 100);
        let percents: Vec<u8> = store.events(id).iter().map(|e| e.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    let a = store.outcome(&first).unwrap();
    let b = store.outcome(&second).unwrap();
    match (&a, &b) {
        (RunOutcome::Done(a), RunOutcome::Done(b)) => {
            assert_eq!(a.topic.as_str(), "Comets");
            assert_eq!(b.topic.as_str(), "Glaciers");
            assert_ne!(a.run_dir, b.run_dir);
            assert_eq!(a.images.len() + b.images.len(), 14);
        }
        _ => panic!("both runs should finish"),
    }
}

#[tokio::test]
async fn test_unknown_session_reports_not_found() {
    let store = ProgressStore::new();
    let snapshot = store.status("nope");
    assert_eq!(snapshot.progress, 0);
    assert_eq!(snapshot.status, "Session not found");
}

#[tokio::test]
async fn test_finished_sessions_are_evicted_and_keep_no_image_bytes() {
    let dir = TempDir::new().unwrap();
    let painter = ScriptedImages::always("painter", Reply::Image(2000));
    let mut settings = batch_settings(dir.path());
    settings.max_images = Some(1);
    let pipeline = Arc::new(pipeline(
        Arc::new(DownText),
        image_generator(vec![painter as Arc<dyn ImageBackend>]),
        settings,
    ));
    let store = Arc::new(ProgressStore::with_retention(PrunePolicy {
        max_completed: 2,
        max_age_ms: u64::MAX,
    }));

    let mut ids = Vec::new();
    for topic in ["Moons", "Rings", "Storms", "Auroras"] {
        let id = pipeline.start_session(&store, Topic::new(topic).unwrap());
        for _ in 0..200 {
            if store.outcome(&id).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        ids.push(id);
    }

    assert_eq!(store.list_sessions().len(), 2);
    assert!(store.get_session(&ids[0]).is_none());
    assert_eq!(store.status(&ids[1]).status, "Session not found");

    let latest = store.outcome(&ids[3]).unwrap();
    let asset = &latest.result().unwrap().images[0];
    assert!(asset.data.is_empty());
    assert_eq!(asset.size(), 2000);
    assert!(asset.path.exists());
}

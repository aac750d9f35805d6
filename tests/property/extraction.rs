//! Property-based tests for prompt extraction and the offline script

use proptest::prelude::*;
use shortsmith::generation::{extract_prompts, fallback_script, strip_markers};
use shortsmith::types::Topic;

fn description() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.'-]{1,40}".prop_filter("needs a visible character", |s| !s.trim().is_empty())
}

/// The offline script is a pure function of the topic
#[test]
fn test_fallback_is_deterministic_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[a-zA-Z0-9 ]{1,30}", |raw| {
            prop_assume!(!raw.trim().is_empty());
            let topic = Topic::new(&raw).unwrap();
            let first = fallback_script(&topic);
            let second = fallback_script(&topic);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(extract_prompts(&first).len(), 7);
            prop_assert!(first.contains(topic.as_str()));
            Ok(())
        })
        .unwrap();
}

/// Every embedded marker comes back once, in order, whatever surrounds it
#[test]
fn test_extraction_preserves_count_and_order_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(description(), 0..8),
                "[a-z \n]{0,20}",
            ),
            |(descriptions, filler)| {
                let mut text = String::new();
                for (i, d) in descriptions.iter().enumerate() {
                    text.push_str(&filler);
                    let tag = if i % 2 == 0 { "IMAGE_PROMPT" } else { "image_prompt" };
                    text.push_str(&format!("[{}: {}]", tag, d));
                }
                text.push_str(&filler);

                let prompts = extract_prompts(&text);
                prop_assert_eq!(prompts.len(), descriptions.len());
                for (i, (prompt, d)) in prompts.iter().zip(&descriptions).enumerate() {
                    prop_assert_eq!(prompt.index, i);
                    prop_assert_eq!(prompt.description.as_str(), d.trim());
                }
                prop_assert!(extract_prompts(&strip_markers(&text)).is_empty());
                Ok(())
            },
        )
        .unwrap();
}

//! Property-based tests for the progress schedule

use proptest::prelude::*;
use shortsmith::pipeline::image_percent;

/// Image percentages stay inside 50..=80 and never decrease
#[test]
fn test_image_percent_is_bounded_and_monotonic_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..50), |total| {
            let percents: Vec<u8> = (1..=total).map(|i| image_percent(i, total)).collect();
            prop_assert!(percents.iter().all(|p| (50..=80).contains(p)));
            prop_assert!(percents.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(percents[total - 1], 80);
            Ok(())
        })
        .unwrap();
}

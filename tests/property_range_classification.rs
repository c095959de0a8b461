//! Property Test: Range Classification
//!
//! This property test verifies that:
//! - Values inside [min, max] always classify as ok
//! - Values beyond the 0.8 / 1.2 slack band classify as critical
//! - Values between the range and the slack band classify as warning
//! - Progress percentages stay within 0..=100

use plantpulse::test_utils::generators;
use plantpulse::{classify, progress_pct, ColorToken, OptimalRange, OptimalRanges, Tier};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: In-range values are ok, whatever the range's sign
    #[test]
    fn prop_in_range_is_ok(range in generators::optimal_range(), t in 0.0f64..=1.0) {
        let value = (range.min + (range.max - range.min) * t).clamp(range.min, range.max);
        let classification = classify(value, &range);
        prop_assert_eq!(classification.tier, Tier::Ok);
        prop_assert_eq!(classification.color, ColorToken::Normal);
    }

    /// Property: Far below the minimum is critical
    #[test]
    fn prop_far_below_is_critical(range in generators::positive_range(), factor in 0.0f64..0.79) {
        let value = range.min * factor;
        prop_assert_eq!(classify(value, &range).tier, Tier::Critical);
    }

    /// Property: Far above the maximum is critical
    #[test]
    fn prop_far_above_is_critical(range in generators::positive_range(), factor in 1.21f64..10.0) {
        let value = range.max * factor;
        prop_assert_eq!(classify(value, &range).tier, Tier::Critical);
    }

    /// Property: Just outside the range is a warning
    #[test]
    fn prop_slack_band_is_warning(range in generators::positive_range(), factor in 0.81f64..0.99) {
        let below = range.min * factor;
        prop_assert_eq!(classify(below, &range).tier, Tier::Warning);

        let above = range.max * (2.0 - factor);
        prop_assert_eq!(classify(above, &range).tier, Tier::Warning);
    }

    /// Property: Progress is always a percentage
    #[test]
    fn prop_progress_is_bounded(range in generators::optimal_range(), value in generators::reading()) {
        let pct = progress_pct(value, &range);
        prop_assert!((0.0..=100.0).contains(&pct), "progress {} out of bounds", pct);
    }
}

#[test]
fn test_moisture_scenarios() {
    let range = OptimalRange::new(40.0, 80.0).unwrap();

    assert_eq!(classify(42.0, &range).tier, Tier::Ok);
    assert_eq!(classify(35.0, &range).tier, Tier::Warning);
    assert_eq!(classify(20.0, &range).tier, Tier::Critical);
    assert_eq!(classify(100.0, &range).tier, Tier::Critical);

    // Edges of the slack band
    assert_eq!(classify(32.0, &range).tier, Tier::Warning);
    assert_eq!(classify(96.0, &range).tier, Tier::Warning);
}

#[test]
fn test_default_ranges_on_sample_plant() {
    let ranges = OptimalRanges::default();
    let readings = plantpulse::SensorReadings {
        moisture: 72.0,
        temperature: 24.5,
        humidity: 65.0,
        light: 8500.0,
    };

    let reports = ranges.classify_all(&readings);
    assert_eq!(reports.len(), 4);
    assert!(reports.iter().all(|r| r.classification.tier == Tier::Ok));
    assert_eq!(reports[0].progress_pct, 90.0);
}

#[test]
fn test_inverted_range_rejected() {
    assert!(OptimalRange::new(80.0, 40.0).is_err());
    assert!(OptimalRange::new(f64::NAN, 40.0).is_err());
}

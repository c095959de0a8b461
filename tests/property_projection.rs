//! Property Test: Device Projection and Stats
//!
//! This property test verifies that:
//! - Projection is total over sparse records and never mutates them
//! - Missing battery is hidden, while a zero battery is shown as 0%
//! - Aggregated totals always equal the device count
//! - Sensor averages stay within the reported values

use plantpulse::test_utils::generators;
use plantpulse::{
    aggregate, project, BatteryDisplay, UsDateFormatter, NEVER_WATERED, UNKNOWN_SPECIES,
    UNNAMED_PLANT,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Every projected text field is non-blank and the input is untouched
    #[test]
    fn prop_projection_is_total(device in generators::sparse_device()) {
        let before = device.clone();
        let view = project(&device, &UsDateFormatter);

        prop_assert!(!view.name.trim().is_empty());
        prop_assert!(!view.species.trim().is_empty());
        prop_assert!(!view.location.trim().is_empty());
        if device.last_watered.is_none() {
            prop_assert_eq!(view.last_watered.as_str(), NEVER_WATERED);
        } else {
            prop_assert_ne!(view.last_watered.as_str(), NEVER_WATERED);
        }
        prop_assert_eq!(&device, &before);

        let blank_name = device.plant_name.as_deref().map_or(true, |n| n.trim().is_empty());
        if blank_name {
            prop_assert_eq!(view.name.as_str(), UNNAMED_PLANT);
        }
        let blank_species = device.plant_species.as_deref().map_or(true, |s| s.trim().is_empty());
        if blank_species {
            prop_assert_eq!(view.species.as_str(), UNKNOWN_SPECIES);
        }
    }

    /// Property: Battery display follows presence, not value
    #[test]
    fn prop_battery_visibility(device in generators::sparse_device()) {
        let view = project(&device, &UsDateFormatter);
        match device.battery_level {
            Some(level) => {
                prop_assert_eq!(view.battery, BatteryDisplay::Level(level));
                prop_assert_eq!(view.battery.label(), Some(format!("{}%", level)));
            }
            None => prop_assert!(!view.battery.is_visible()),
        }
    }

    /// Property: Totals match input and averages are bounded by the readings
    #[test]
    fn prop_aggregate_is_consistent(devices in prop::collection::vec(generators::sparse_device(), 0..20)) {
        let stats = aggregate(&devices);

        prop_assert_eq!(stats.total_plants, devices.len());
        prop_assert_eq!(stats.online + stats.standby + stats.offline, devices.len());
        prop_assert_eq!(
            stats.health.excellent + stats.health.good + stats.health.moderate
                + stats.health.poor + stats.health.unreported,
            devices.len()
        );

        let moistures: Vec<f64> = devices.iter().filter_map(|d| d.soil_moisture).collect();
        match stats.averages.soil_moisture {
            Some(avg) => {
                let lo = moistures.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = moistures.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(avg >= lo - 1e-9 && avg <= hi + 1e-9);
            }
            None => prop_assert!(moistures.is_empty()),
        }
    }
}

#[test]
fn test_aggregate_empty() {
    let stats = aggregate(&[]);
    assert_eq!(stats.total_plants, 0);
    assert_eq!(stats.averages.soil_moisture, None);
}

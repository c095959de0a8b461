use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Device, DeviceStatus, HealthStatus, PumpStatus, DEFAULT_PLANT_IMAGE};
use crate::ranges::{moisture_tier, BatteryTier, SensorReadings, Tier};
use crate::time::DateFormatter;

pub const UNNAMED_PLANT: &str = "Unnamed Plant";
pub const UNKNOWN_SPECIES: &str = "Unknown Species";
pub const UNSPECIFIED_LOCATION: &str = "Not specified";
pub const NEVER_WATERED: &str = "Never";
pub const UNKNOWN_DATE: &str = "Unknown";

/// Battery reading as shown to the user. Absence is not the same as 0%.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "level", rename_all = "lowercase")]
pub enum BatteryDisplay {
    Absent,
    Level(u8),
}

impl BatteryDisplay {
    pub fn from_level(level: Option<u8>) -> Self {
        match level {
            Some(level) => BatteryDisplay::Level(level),
            None => BatteryDisplay::Absent,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, BatteryDisplay::Level(_))
    }

    pub fn tier(&self) -> Option<BatteryTier> {
        match self {
            BatteryDisplay::Level(level) => Some(BatteryTier::from_level(*level)),
            BatteryDisplay::Absent => None,
        }
    }

    /// "0%" for a real zero reading, `None` when the display is suppressed
    pub fn label(&self) -> Option<String> {
        match self {
            BatteryDisplay::Level(level) => Some(format!("{}%", level)),
            BatteryDisplay::Absent => None,
        }
    }
}

/// Display-ready projection of a [`Device`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantView {
    pub id: String,
    pub name: String,
    pub species: String,
    pub image: String,
    pub has_custom_image: bool,
    pub serial_number: String,
    pub location: String,
    pub has_location: bool,
    pub status: DeviceStatus,
    pub health: HealthStatus,
    pub battery: BatteryDisplay,
    pub battery_tier: Option<BatteryTier>,
    pub readings: SensorReadings,
    /// Card badge for soil moisture
    pub moisture_tier: Tier,
    pub pump_status: PumpStatus,
    pub added_date: String,
    pub last_watered: String,
}

/// Project a raw device record into its view model.
///
/// Total over any record: every absent or blank optional field resolves to a
/// placeholder, and the record itself is left untouched.
pub fn project(device: &Device, formatter: &dyn DateFormatter) -> PlantView {
    let image = non_blank(device.plant_image.as_deref());
    let location = non_blank(device.location.as_deref());
    let battery = BatteryDisplay::from_level(device.battery_level);
    let moisture = device.soil_moisture.unwrap_or(0.0);

    PlantView {
        id: device.id.clone(),
        name: non_blank(device.plant_name.as_deref())
            .unwrap_or(UNNAMED_PLANT)
            .to_string(),
        species: non_blank(device.plant_species.as_deref())
            .unwrap_or(UNKNOWN_SPECIES)
            .to_string(),
        image: image.unwrap_or(DEFAULT_PLANT_IMAGE).to_string(),
        has_custom_image: image.is_some(),
        serial_number: device.serial_number.clone(),
        location: location.unwrap_or(UNSPECIFIED_LOCATION).to_string(),
        has_location: location.is_some(),
        status: device.status,
        health: device.health_status.unwrap_or(HealthStatus::Good),
        battery,
        battery_tier: battery.tier(),
        readings: SensorReadings {
            moisture,
            temperature: device.air_temperature.unwrap_or(0.0),
            humidity: device.air_humidity.unwrap_or(0.0),
            light: device.light_intensity.unwrap_or(0.0),
        },
        moisture_tier: moisture_tier(moisture),
        pump_status: device.pump_status,
        added_date: device
            .created_date
            .as_ref()
            .map(|ts| formatter.format_date(ts))
            .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        last_watered: device
            .last_watered
            .as_ref()
            .map(|ts| formatter.format_datetime(ts))
            .unwrap_or_else(|| NEVER_WATERED.to_string()),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Light intensity in thousands of lux, rounded half away from zero to the
/// given decimals: `8.5k`, `9k`
pub fn format_kilo_lux(lux: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let kilo = (lux / 1000.0 * scale).round() / scale;
    format!("{:.*}k", decimals, kilo)
}

/// Percentage reading, trimmed of a trailing `.0`
pub fn format_percent(value: f64) -> String {
    format!("{}%", Trimmed(value))
}

/// Temperature reading in degrees Celsius
pub fn format_celsius(value: f64) -> String {
    format!("{}°C", Trimmed(value))
}

/// Prints whole numbers without a fractional part and others with at most
/// one decimal
struct Trimmed(f64);

impl fmt::Display for Trimmed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = (self.0 * 10.0).round() / 10.0;
        if rounded.fract() == 0.0 {
            write!(f, "{:.0}", rounded)
        } else {
            write!(f, "{:.1}", rounded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::UsDateFormatter;
    use chrono::{DateTime, Utc};

    fn bare_device() -> Device {
        serde_json::from_str(r#"{"id":"d1","serial_number":"PP-2024-A7B3C9D2"}"#).unwrap()
    }

    #[test]
    fn test_placeholders_for_bare_record() {
        let view = project(&bare_device(), &UsDateFormatter);

        assert_eq!(view.name, UNNAMED_PLANT);
        assert_eq!(view.species, UNKNOWN_SPECIES);
        assert_eq!(view.location, UNSPECIFIED_LOCATION);
        assert!(!view.has_location);
        assert_eq!(view.image, DEFAULT_PLANT_IMAGE);
        assert!(!view.has_custom_image);
        assert_eq!(view.health, HealthStatus::Good);
        assert_eq!(view.readings, SensorReadings::default());
        assert_eq!(view.added_date, UNKNOWN_DATE);
        assert_eq!(view.last_watered, NEVER_WATERED);
    }

    #[test]
    fn test_blank_strings_count_as_absent() {
        let mut device = bare_device();
        device.plant_name = Some("   ".to_string());
        device.plant_species = Some(String::new());

        let view = project(&device, &UsDateFormatter);
        assert_eq!(view.name, UNNAMED_PLANT);
        assert_eq!(view.species, UNKNOWN_SPECIES);
    }

    #[test]
    fn test_battery_absent_vs_zero() {
        let mut device = bare_device();
        let view = project(&device, &UsDateFormatter);
        assert_eq!(view.battery, BatteryDisplay::Absent);
        assert!(!view.battery.is_visible());
        assert_eq!(view.battery.label(), None);

        device.battery_level = Some(0);
        let view = project(&device, &UsDateFormatter);
        assert_eq!(view.battery, BatteryDisplay::Level(0));
        assert_eq!(view.battery.label().as_deref(), Some("0%"));
        assert_eq!(view.battery.tier(), Some(BatteryTier::Low));
        assert_eq!(view.battery_tier, Some(BatteryTier::Low));

        device.battery_level = Some(87);
        assert_eq!(
            project(&device, &UsDateFormatter).battery_tier,
            Some(BatteryTier::High)
        );
    }

    #[test]
    fn test_moisture_badge() {
        let mut device = bare_device();
        assert_eq!(project(&device, &UsDateFormatter).moisture_tier, Tier::Critical);

        device.soil_moisture = Some(45.0);
        assert_eq!(project(&device, &UsDateFormatter).moisture_tier, Tier::Warning);

        device.soil_moisture = Some(72.0);
        assert_eq!(project(&device, &UsDateFormatter).moisture_tier, Tier::Ok);
    }

    #[test]
    fn test_dates_use_formatter() {
        let mut device = bare_device();
        device.created_date = Some(
            "2024-01-15T10:30:00Z".parse::<DateTime<Utc>>().unwrap(),
        );
        device.last_watered = Some(
            "2024-03-02T08:05:00Z".parse::<DateTime<Utc>>().unwrap(),
        );

        let view = project(&device, &UsDateFormatter);
        assert_eq!(view.added_date, "1/15/2024");
        assert_eq!(view.last_watered, "3/2/2024, 8:05:00 AM");
    }

    #[test]
    fn test_projection_leaves_device_untouched() {
        let mut device = bare_device();
        device.soil_moisture = Some(72.0);
        let before = device.clone();

        let view = project(&device, &UsDateFormatter);
        assert_eq!(view.readings.moisture, 72.0);
        assert_eq!(device, before);
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(format_kilo_lux(8500.0, 1), "8.5k");
        assert_eq!(format_kilo_lux(8500.0, 0), "9k");
        assert_eq!(format_kilo_lux(12_400.0, 0), "12k");
        assert_eq!(format_kilo_lux(0.0, 0), "0k");
        assert_eq!(format_percent(72.0), "72%");
        assert_eq!(format_percent(41.26), "41.3%");
        assert_eq!(format_celsius(24.5), "24.5°C");
        assert_eq!(format_celsius(24.0), "24°C");
    }
}

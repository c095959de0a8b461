use serde::{Deserialize, Serialize};

use crate::validators::ValidationError;

/// Lower slack factor: readings below `min * 0.8` are critical
pub const CRITICAL_LOW_FACTOR: f64 = 0.8;
/// Upper slack factor: readings above `max * 1.2` are critical
pub const CRITICAL_HIGH_FACTOR: f64 = 1.2;

/// The four monitored metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Moisture,
    Temperature,
    Humidity,
    Light,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Moisture,
        Metric::Temperature,
        Metric::Humidity,
        Metric::Light,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Moisture => "moisture",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Light => "light",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Moisture => "Soil Moisture",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Air Humidity",
            Metric::Light => "Light Intensity",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Moisture | Metric::Humidity => "%",
            Metric::Temperature => "°C",
            Metric::Light => " lux",
        }
    }
}

/// Healthy band for one metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OptimalRange {
    pub min: f64,
    pub max: f64,
}

impl OptimalRange {
    /// Checked constructor: bounds must be finite and ordered
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ValidationError::new(
                "optimal_range",
                "Range bounds must be finite numbers",
            ));
        }
        if min > max {
            return Err(ValidationError::new(
                "optimal_range",
                format!("Range minimum {} exceeds maximum {}", min, max),
            ));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// "40-80%" style caption
    pub fn caption(&self, unit: &str) -> String {
        format!("{}-{}{}", self.min, self.max, unit)
    }
}

/// Classification of a reading against its optimal range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Ok,
    Warning,
    Critical,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Ok => "ok",
            Tier::Warning => "warning",
            Tier::Critical => "critical",
        }
    }

    pub fn color(&self) -> ColorToken {
        match self {
            Tier::Ok => ColorToken::Normal,
            Tier::Warning => ColorToken::Warning,
            Tier::Critical => ColorToken::Critical,
        }
    }
}

/// Semantic color bucket the view layer maps to its palette
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Normal,
    Warning,
    Critical,
}

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorToken::Normal => "normal",
            ColorToken::Warning => "warning",
            ColorToken::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub tier: Tier,
    pub color: ColorToken,
}

/// Classify a reading against its optimal range.
///
/// The in-range check runs first, so a value inside `[min, max]` is always
/// `Ok`. The critical slack band is `min * 0.8` / `max * 1.2` taken literally,
/// including for ranges with non-positive bounds.
pub fn classify(value: f64, range: &OptimalRange) -> Classification {
    let tier = if range.contains(value) {
        Tier::Ok
    } else if value < range.min * CRITICAL_LOW_FACTOR || value > range.max * CRITICAL_HIGH_FACTOR {
        Tier::Critical
    } else {
        Tier::Warning
    };

    Classification {
        tier,
        color: tier.color(),
    }
}

/// Fill level of a progress bar, as a percentage of the range maximum
pub fn progress_pct(value: f64, range: &OptimalRange) -> f64 {
    if range.max <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value * 100.0 / range.max).clamp(0.0, 100.0)
}

/// Soil moisture badge used on plant cards, independent of any range
pub fn moisture_tier(moisture_pct: f64) -> Tier {
    if moisture_pct >= 60.0 {
        Tier::Ok
    } else if moisture_pct >= 30.0 {
        Tier::Warning
    } else {
        Tier::Critical
    }
}

/// Battery indicator color
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatteryTier {
    High,
    Medium,
    Low,
}

impl BatteryTier {
    pub fn from_level(level: u8) -> Self {
        if level > 50 {
            BatteryTier::High
        } else if level > 20 {
            BatteryTier::Medium
        } else {
            BatteryTier::Low
        }
    }
}

/// One reading per metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SensorReadings {
    pub moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
}

impl SensorReadings {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Moisture => self.moisture,
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::Light => self.light,
        }
    }
}

/// A classified reading ready for a sensor card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricReport {
    pub metric: Metric,
    pub value: f64,
    pub range: OptimalRange,
    /// Optimal range as printed under the reading, e.g. "40-80%"
    pub caption: String,
    pub classification: Classification,
    pub progress_pct: f64,
}

/// Static per-metric configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OptimalRanges {
    pub moisture: OptimalRange,
    pub temperature: OptimalRange,
    pub humidity: OptimalRange,
    pub light: OptimalRange,
}

impl Default for OptimalRanges {
    fn default() -> Self {
        Self {
            moisture: OptimalRange { min: 40.0, max: 80.0 },
            temperature: OptimalRange { min: 18.0, max: 30.0 },
            humidity: OptimalRange { min: 50.0, max: 80.0 },
            light: OptimalRange {
                min: 5000.0,
                max: 15000.0,
            },
        }
    }
}

impl OptimalRanges {
    pub fn get(&self, metric: Metric) -> &OptimalRange {
        match metric {
            Metric::Moisture => &self.moisture,
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::Light => &self.light,
        }
    }

    pub fn classify(&self, metric: Metric, value: f64) -> Classification {
        classify(value, self.get(metric))
    }

    /// Classify every metric of a reading set, in display order
    pub fn classify_all(&self, readings: &SensorReadings) -> Vec<MetricReport> {
        Metric::ALL
            .iter()
            .map(|&metric| {
                let range = *self.get(metric);
                let value = readings.get(metric);
                MetricReport {
                    metric,
                    value,
                    range,
                    caption: range.caption(metric.unit()),
                    classification: classify(value, &range),
                    progress_pct: progress_pct(value, &range),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moisture() -> OptimalRange {
        OptimalRange::new(40.0, 80.0).unwrap()
    }

    #[test]
    fn test_classify_scenarios() {
        assert_eq!(classify(42.0, &moisture()).tier, Tier::Ok);
        assert_eq!(classify(35.0, &moisture()).tier, Tier::Warning);
        assert_eq!(classify(20.0, &moisture()).tier, Tier::Critical);
        assert_eq!(classify(100.0, &moisture()).tier, Tier::Critical);
    }

    #[test]
    fn test_classify_boundaries() {
        // Range edges are inclusive
        assert_eq!(classify(40.0, &moisture()).tier, Tier::Ok);
        assert_eq!(classify(80.0, &moisture()).tier, Tier::Ok);
        // Slack edges are still warning
        assert_eq!(classify(32.0, &moisture()).tier, Tier::Warning);
        assert_eq!(classify(96.0, &moisture()).tier, Tier::Warning);
        assert_eq!(classify(31.99, &moisture()).tier, Tier::Critical);
        assert_eq!(classify(96.01, &moisture()).tier, Tier::Critical);
    }

    #[test]
    fn test_color_follows_tier() {
        assert_eq!(classify(42.0, &moisture()).color, ColorToken::Normal);
        assert_eq!(classify(35.0, &moisture()).color, ColorToken::Warning);
        assert_eq!(classify(20.0, &moisture()).color, ColorToken::Critical);
    }

    #[test]
    fn test_degenerate_range() {
        let point = OptimalRange::new(50.0, 50.0).unwrap();
        assert_eq!(classify(50.0, &point).tier, Tier::Ok);
        assert_eq!(classify(49.0, &point).tier, Tier::Warning);
        assert_eq!(classify(55.0, &point).tier, Tier::Warning);
        assert_eq!(classify(39.0, &point).tier, Tier::Critical);
        assert_eq!(classify(61.0, &point).tier, Tier::Critical);
    }

    #[test]
    fn test_zero_minimum_has_no_low_slack() {
        let range = OptimalRange::new(0.0, 10.0).unwrap();
        assert_eq!(classify(0.0, &range).tier, Tier::Ok);
        assert_eq!(classify(-0.5, &range).tier, Tier::Critical);
    }

    #[test]
    fn test_range_validation() {
        assert!(OptimalRange::new(80.0, 40.0).is_err());
        assert!(OptimalRange::new(f64::NAN, 40.0).is_err());
        assert!(OptimalRange::new(0.0, f64::INFINITY).is_err());
        assert!(OptimalRange::new(-5.0, 5.0).is_ok());
    }

    #[test]
    fn test_progress_pct() {
        assert_eq!(progress_pct(40.0, &moisture()), 50.0);
        assert_eq!(progress_pct(120.0, &moisture()), 100.0);
        assert_eq!(progress_pct(-3.0, &moisture()), 0.0);
        let zero = OptimalRange::new(0.0, 0.0).unwrap();
        assert_eq!(progress_pct(10.0, &zero), 0.0);
    }

    #[test]
    fn test_moisture_tier() {
        assert_eq!(moisture_tier(72.0), Tier::Ok);
        assert_eq!(moisture_tier(60.0), Tier::Ok);
        assert_eq!(moisture_tier(42.0), Tier::Warning);
        assert_eq!(moisture_tier(12.0), Tier::Critical);
    }

    #[test]
    fn test_battery_tier() {
        assert_eq!(BatteryTier::from_level(95), BatteryTier::High);
        assert_eq!(BatteryTier::from_level(50), BatteryTier::Medium);
        assert_eq!(BatteryTier::from_level(21), BatteryTier::Medium);
        assert_eq!(BatteryTier::from_level(20), BatteryTier::Low);
        assert_eq!(BatteryTier::from_level(0), BatteryTier::Low);
    }

    #[test]
    fn test_classify_all_default_ranges() {
        let readings = SensorReadings {
            moisture: 72.0,
            temperature: 24.5,
            humidity: 45.0,
            light: 2000.0,
        };
        let reports = OptimalRanges::default().classify_all(&readings);
        let tiers: Vec<Tier> = reports.iter().map(|r| r.classification.tier).collect();
        assert_eq!(
            tiers,
            vec![Tier::Ok, Tier::Ok, Tier::Warning, Tier::Critical]
        );
        assert_eq!(reports[0].metric, Metric::Moisture);
        assert_eq!(reports[0].progress_pct, 90.0);
        assert_eq!(reports[0].caption, "40-80%");
        assert_eq!(reports[3].caption, "5000-15000 lux");
    }

    #[test]
    fn test_caption() {
        let ranges = OptimalRanges::default();
        assert_eq!(ranges.moisture.caption(Metric::Moisture.unit()), "40-80%");
        assert_eq!(ranges.light.caption(Metric::Light.unit()), "5000-15000 lux");
    }
}

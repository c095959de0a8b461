use serde::{Deserialize, Serialize};

use crate::domain::{Device, DeviceStatus, HealthStatus, PumpStatus};

/// Summary figures for the dashboard header and analytics cards
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_plants: usize,
    pub online: usize,
    pub standby: usize,
    pub offline: usize,
    pub pumps_on: usize,
    pub health: HealthDistribution,
    pub averages: SensorAverages,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthDistribution {
    pub excellent: usize,
    pub good: usize,
    pub moderate: usize,
    pub poor: usize,
    /// Devices that carry no health status at all
    pub unreported: usize,
}

impl HealthDistribution {
    pub fn count(&self, health: HealthStatus) -> usize {
        match health {
            HealthStatus::Excellent => self.excellent,
            HealthStatus::Good => self.good,
            HealthStatus::Moderate => self.moderate,
            HealthStatus::Poor => self.poor,
        }
    }
}

/// Mean of each sensor over the devices that report it. `None` when no device
/// reports the sensor, so a missing value never drags an average toward 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorAverages {
    pub soil_moisture: Option<f64>,
    pub air_temperature: Option<f64>,
    pub air_humidity: Option<f64>,
    pub light_intensity: Option<f64>,
}

/// Pure reduction over a device list already filtered to the current owner
pub fn aggregate(devices: &[Device]) -> DashboardStats {
    let mut stats = DashboardStats {
        total_plants: devices.len(),
        ..DashboardStats::default()
    };

    for device in devices {
        match device.status {
            DeviceStatus::Online => stats.online += 1,
            DeviceStatus::Standby => stats.standby += 1,
            DeviceStatus::Offline => stats.offline += 1,
        }

        if device.pump_status == PumpStatus::On {
            stats.pumps_on += 1;
        }

        match device.health_status {
            Some(HealthStatus::Excellent) => stats.health.excellent += 1,
            Some(HealthStatus::Good) => stats.health.good += 1,
            Some(HealthStatus::Moderate) => stats.health.moderate += 1,
            Some(HealthStatus::Poor) => stats.health.poor += 1,
            None => stats.health.unreported += 1,
        }
    }

    stats.averages = SensorAverages {
        soil_moisture: mean(devices.iter().filter_map(|d| d.soil_moisture)),
        air_temperature: mean(devices.iter().filter_map(|d| d.air_temperature)),
        air_humidity: mean(devices.iter().filter_map(|d| d.air_humidity)),
        light_intensity: mean(devices.iter().filter_map(|d| d.light_intensity)),
    };

    stats
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str) -> Device {
        serde_json::from_str(&format!(r#"{{"id":"{}","serial_number":"PP-{}"}}"#, id, id))
            .unwrap()
    }

    #[test]
    fn test_empty_list() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_plants, 0);
        assert_eq!(stats.averages, SensorAverages::default());
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_counts() {
        let mut a = device("a");
        a.status = DeviceStatus::Online;
        a.pump_status = PumpStatus::On;
        a.health_status = Some(HealthStatus::Excellent);
        let mut b = device("b");
        b.status = DeviceStatus::Standby;
        b.health_status = Some(HealthStatus::Poor);
        let c = device("c");

        let stats = aggregate(&[a, b, c]);
        assert_eq!(stats.total_plants, 3);
        assert_eq!(stats.online, 1);
        assert_eq!(stats.standby, 1);
        assert_eq!(stats.offline, 1);
        assert_eq!(stats.pumps_on, 1);
        assert_eq!(stats.health.count(HealthStatus::Excellent), 1);
        assert_eq!(stats.health.count(HealthStatus::Poor), 1);
        assert_eq!(stats.health.unreported, 1);
    }

    #[test]
    fn test_averages_skip_missing_readings() {
        let mut a = device("a");
        a.soil_moisture = Some(40.0);
        let mut b = device("b");
        b.soil_moisture = Some(80.0);
        let mut c = device("c");
        c.air_temperature = Some(21.0);

        let stats = aggregate(&[a, b, c]);
        assert_eq!(stats.averages.soil_moisture, Some(60.0));
        assert_eq!(stats.averages.air_temperature, Some(21.0));
        assert_eq!(stats.averages.air_humidity, None);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let devices = vec![device("a"), device("b")];
        let before = devices.clone();
        let _ = aggregate(&devices);
        assert_eq!(devices, before);
    }
}

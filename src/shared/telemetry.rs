use async_trait::async_trait;
use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::domain::{Device, DeviceFields, DeviceStatus, HealthStatus, PumpStatus};
use crate::error::StoreError;
use crate::id_generator::IdGenerator;
use crate::store::{EntityStore, InMemoryStore};
use crate::time::Clock;

/// Plants the mock source picks from: (name, species, location)
const CATALOG: &[(&str, &str, &str)] = &[
    ("Monstera Deliciosa", "Swiss Cheese Plant", "Living Room - Window Side"),
    ("Fiddle Leaf Fig", "Ficus lyrata", "Office"),
    ("Snake Plant", "Sansevieria trifasciata", "Bedroom"),
    ("Golden Pothos", "Epipremnum aureum", "Kitchen Shelf"),
    ("Peace Lily", "Spathiphyllum wallisii", "Bathroom"),
    ("Basil", "Ocimum basilicum", "Balcony Planter"),
    ("Aloe Vera", "Aloe barbadensis", "Sunroom"),
    ("Boston Fern", "Nephrolepis exaltata", "Porch"),
];

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Window of a generated history series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryWindow {
    /// 24 hourly points
    Day,
    /// 7 daily averages
    Week,
    /// 30 daily points
    Month,
}

impl HistoryWindow {
    pub fn points(&self) -> usize {
        match self {
            HistoryWindow::Day => 24,
            HistoryWindow::Week => 7,
            HistoryWindow::Month => 30,
        }
    }
}

/// One point of a history chart. Series that do not carry a metric leave it
/// empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryPoint {
    pub label: String,
    pub moisture: f64,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watering_events: Option<u8>,
}

/// Analytics series for the requested window
pub fn generate_history<R: Rng + ?Sized>(window: HistoryWindow, rng: &mut R) -> Vec<HistoryPoint> {
    match window {
        HistoryWindow::Day => (0..24)
            .map(|hour| HistoryPoint {
                label: format!("{}:00", hour),
                moisture: rng.gen_range(30.0..80.0),
                temperature: rng.gen_range(18.0..28.0),
                humidity: Some(rng.gen_range(40.0..80.0)),
                // Lights out for roughly a third of the day
                light: Some(if rng.gen_bool(0.7) {
                    rng.gen_range(3000.0..15000.0)
                } else {
                    0.0
                }),
                watering_events: None,
            })
            .collect(),
        HistoryWindow::Week => WEEKDAYS
            .iter()
            .map(|day| HistoryPoint {
                label: day.to_string(),
                moisture: rng.gen_range(40.0..70.0),
                temperature: rng.gen_range(20.0..26.0),
                humidity: None,
                light: Some(rng.gen_range(5000.0..10000.0)),
                watering_events: Some(rng.gen_range(0..3)),
            })
            .collect(),
        HistoryWindow::Month => (1..=30)
            .map(|day| HistoryPoint {
                label: day.to_string(),
                moisture: rng.gen_range(35.0..75.0),
                temperature: rng.gen_range(19.0..27.0),
                humidity: None,
                light: None,
                watering_events: None,
            })
            .collect(),
    }
}

/// Seven-day series shown on a single plant's detail screen
pub fn plant_week_history<R: Rng + ?Sized>(rng: &mut R) -> Vec<HistoryPoint> {
    WEEKDAYS
        .iter()
        .map(|day| HistoryPoint {
            label: day.to_string(),
            moisture: rng.gen_range(40.0..80.0),
            temperature: rng.gen_range(20.0..28.0),
            humidity: Some(rng.gen_range(50.0..80.0)),
            light: Some(rng.gen_range(5000.0..15000.0)),
            watering_events: None,
        })
        .collect()
}

/// Six four-hourly points for the dashboard trend chart
pub fn dashboard_trend<R: Rng + ?Sized>(rng: &mut R) -> Vec<HistoryPoint> {
    (0..6)
        .map(|i| HistoryPoint {
            label: format!("{:02}:00", i * 4),
            moisture: rng.gen_range(30.0..70.0),
            temperature: rng.gen_range(20.0..28.0),
            humidity: Some(rng.gen_range(50.0..80.0)),
            light: Some(rng.gen_range(5000.0..20000.0)),
            watering_events: None,
        })
        .collect()
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Randomized create payload owned by `owner`
pub fn random_device_fields<R: Rng + ?Sized>(
    owner: &str,
    clock: &dyn Clock,
    rng: &mut R,
) -> DeviceFields {
    let (name, species, location) = CATALOG.choose(rng).copied().unwrap_or(CATALOG[0]);
    let now = clock.now();

    let mut fields = DeviceFields::new(name, format!("PP-2024-{:08X}", rng.gen::<u32>()))
        .with_species(species)
        .with_location(location);

    fields.status = match rng.gen_range(0..10) {
        0..=6 => DeviceStatus::Online,
        7..=8 => DeviceStatus::Standby,
        _ => DeviceStatus::Offline,
    };
    fields.battery_level = Some(rng.gen_range(5..=100));
    fields.soil_moisture = Some(one_decimal(rng.gen_range(25.0..85.0)));
    fields.air_temperature = Some(one_decimal(rng.gen_range(16.0..32.0)));
    fields.air_humidity = Some(one_decimal(rng.gen_range(40.0..85.0)));
    fields.light_intensity = Some(rng.gen_range(2000.0..16000.0_f64).round());
    fields.pump_status = if rng.gen_bool(0.2) {
        PumpStatus::On
    } else {
        PumpStatus::Off
    };
    fields.health_status = HealthStatus::ALL.choose(rng).copied();
    fields.created_by = Some(owner.to_string());
    fields.last_reading = Some(now);
    fields.last_watered = Some(now - Duration::hours(rng.gen_range(1..72)));
    fields
}

/// Mock data source behind the regular store interface
pub struct MockTelemetry {
    store: InMemoryStore,
}

impl MockTelemetry {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: InMemoryStore::new(ids, clock),
        }
    }

    /// Add `count` random devices owned by `owner`
    pub async fn seed<R: Rng + ?Sized>(
        &self,
        owner: &str,
        count: usize,
        clock: &dyn Clock,
        rng: &mut R,
    ) -> Result<Vec<Device>, StoreError> {
        let payloads: Vec<DeviceFields> = (0..count)
            .map(|_| random_device_fields(owner, clock, rng))
            .collect();

        let mut seeded = Vec::with_capacity(count);
        for fields in payloads {
            seeded.push(self.store.create(fields).await?);
        }

        info!(owner = %owner, count = seeded.len(), "Seeded mock devices");
        Ok(seeded)
    }

    /// Underlying store, for failure injection
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
}

#[async_trait]
impl EntityStore for MockTelemetry {
    async fn list(&self) -> Result<Vec<Device>, StoreError> {
        self.store.list().await
    }

    async fn get(&self, id: &str) -> Result<Option<Device>, StoreError> {
        self.store.get(id).await
    }

    async fn create(&self, fields: DeviceFields) -> Result<Device, StoreError> {
        self.store.create(fields).await
    }

    async fn update(&self, id: &str, fields: DeviceFields) -> Result<Device, StoreError> {
        self.store.update(id, fields).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(id).await
    }
}

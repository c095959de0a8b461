//! Test utilities for property-based testing
//!
//! Generators for device records, create payloads, optimal ranges and
//! readings, built on the proptest framework.

pub mod generators {
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    use crate::domain::{Device, DeviceFields, DeviceStatus, HealthStatus, PumpStatus};
    use crate::ranges::OptimalRange;

    /// Generate a valid serial number, e.g. PP-2024-A7B3C9D2
    pub fn serial_number() -> impl Strategy<Value = String> {
        (2020u32..2031, any::<u32>())
            .prop_map(|(year, suffix)| format!("PP-{}-{:08X}", year, suffix))
    }

    /// Generate a serial number the add form must reject
    pub fn invalid_serial_number() -> impl Strategy<Value = String> {
        prop_oneof![
            // Blank
            Just("".to_string()),
            Just("   ".to_string()),
            // Too long
            prop::string::string_regex("[A-Z0-9]{65,80}").expect("Valid regex"),
            // Non-printable or non-ASCII
            Just("PP-2024-\tA7B3".to_string()),
            Just("PP-2024-ÄÖÜ".to_string()),
        ]
    }

    pub fn plant_name() -> impl Strategy<Value = String> {
        prop::string::string_regex("[A-Z][a-z]{2,12}( [A-Z][a-z]{2,12})?")
            .expect("Valid regex for plant_name")
    }

    pub fn firmware_version() -> impl Strategy<Value = String> {
        (1u32..10, 0u32..20, 0u32..20)
            .prop_map(|(major, minor, patch)| format!("{}.{}.{}", major, minor, patch))
    }

    pub fn device_status() -> impl Strategy<Value = DeviceStatus> {
        prop_oneof![
            Just(DeviceStatus::Online),
            Just(DeviceStatus::Standby),
            Just(DeviceStatus::Offline),
        ]
    }

    pub fn pump_status() -> impl Strategy<Value = PumpStatus> {
        prop_oneof![Just(PumpStatus::On), Just(PumpStatus::Off)]
    }

    pub fn health_status() -> impl Strategy<Value = Option<HealthStatus>> {
        prop::option::of(prop::sample::select(HealthStatus::ALL.to_vec()))
    }

    /// Generate a timestamp between 2020-01-01 and 2030-12-31
    pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (1_577_836_800i64..1_924_991_999i64)
            .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    /// Any finite reading, including negative and out-of-band values
    pub fn reading() -> impl Strategy<Value = f64> {
        -50_000.0f64..50_000.0
    }

    /// Generate a valid optimal range (min <= max, finite)
    pub fn optimal_range() -> impl Strategy<Value = OptimalRange> {
        (-1_000.0f64..20_000.0, 0.0f64..20_000.0).prop_map(|(min, width)| OptimalRange {
            min,
            max: min + width,
        })
    }

    /// Generate a valid optimal range with strictly positive bounds
    pub fn positive_range() -> impl Strategy<Value = OptimalRange> {
        (1.0f64..20_000.0, 0.0f64..20_000.0).prop_map(|(min, width)| OptimalRange {
            min,
            max: min + width,
        })
    }

    /// Generate a create payload the add form accepts
    pub fn device_fields(owner: &'static str) -> impl Strategy<Value = DeviceFields> {
        (
            plant_name(),
            serial_number(),
            device_status(),
            prop::option::of(0u8..=100),
            prop::option::of(0.0f64..100.0),
            prop::option::of(-10.0f64..45.0),
            pump_status(),
            health_status(),
        )
            .prop_map(
                move |(name, serial, status, battery, moisture, temperature, pump, health)| {
                    let mut fields = DeviceFields::new(name, serial);
                    fields.status = status;
                    fields.battery_level = battery;
                    fields.soil_moisture = moisture;
                    fields.air_temperature = temperature;
                    fields.pump_status = pump;
                    fields.health_status = health;
                    fields.created_by = Some(owner.to_string());
                    fields
                },
            )
    }

    /// Generate a stored record where any optional field may be absent or blank
    pub fn sparse_device() -> impl Strategy<Value = Device> {
        let text = || {
            prop::option::of(prop_oneof![
                Just(String::new()),
                Just("  ".to_string()),
                plant_name(),
            ])
        };
        let sensors = (
            prop::option::of(0.0f64..100.0),
            prop::option::of(-10.0f64..45.0),
            prop::option::of(0.0f64..100.0),
            prop::option::of(0.0f64..20_000.0),
        );
        (
            (
                "[a-z0-9-]{8,36}",
                text(),
                text(),
                text(),
                serial_number(),
                text(),
            ),
            (
                device_status(),
                prop::option::of(0u8..=100),
                sensors,
                pump_status(),
                health_status(),
            ),
            (
                prop::option::of(timestamp()),
                prop::option::of(timestamp()),
            ),
        )
            .prop_map(
                |(
                    (id, plant_name, plant_species, plant_image, serial_number, location),
                    (status, battery_level, (moisture, temperature, humidity, light), pump, health),
                    (last_watered, created_date),
                )| Device {
                    id,
                    plant_name,
                    plant_species,
                    plant_image,
                    serial_number,
                    location,
                    firmware_version: None,
                    status,
                    battery_level,
                    soil_moisture: moisture,
                    air_temperature: temperature,
                    air_humidity: humidity,
                    light_intensity: light,
                    pump_status: pump,
                    health_status: health,
                    created_by: None,
                    last_reading: None,
                    last_watered,
                    created_date,
                },
            )
    }
}

pub mod helpers {
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::{Mutex, MutexGuard};

    use crate::domain::{Device, DeviceFields};
    use crate::error::StoreError;
    use crate::id_generator::SequentialIdGenerator;
    use crate::session::{MemorySessionStore, Session, UserSession};
    use crate::store::{EntityStore, InMemoryStore};
    use crate::time::FixedClock;

    pub const TEST_NOW: &str = "2024-01-15T10:30:00Z";

    pub fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::from_rfc3339(TEST_NOW).expect("Valid test timestamp"))
    }

    /// Empty store with deterministic ids and a fixed clock
    pub fn test_store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new(
            Arc::new(SequentialIdGenerator::default()),
            fixed_clock(),
        ))
    }

    pub fn signed_in(full_name: &str, email: &str) -> Session {
        Session::initialize(Arc::new(MemorySessionStore::with_user(UserSession {
            full_name: full_name.to_string(),
            email: email.to_string(),
            avatar_color: None,
        })))
    }

    pub fn signed_out() -> Session {
        Session::initialize(Arc::new(MemorySessionStore::default()))
    }

    /// In-memory store whose calls wait while the gate is held, so a test can
    /// act on a view between a request going out and its result coming back
    pub struct GatedStore {
        inner: InMemoryStore,
        gate: Mutex<()>,
    }

    impl GatedStore {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryStore::new(
                    Arc::new(SequentialIdGenerator::default()),
                    fixed_clock(),
                ),
                gate: Mutex::new(()),
            })
        }

        /// Calls block until the returned guard is dropped
        pub async fn hold(&self) -> MutexGuard<'_, ()> {
            self.gate.lock().await
        }

        pub fn inner(&self) -> &InMemoryStore {
            &self.inner
        }
    }

    #[async_trait]
    impl EntityStore for GatedStore {
        async fn list(&self) -> Result<Vec<Device>, StoreError> {
            let _open = self.gate.lock().await;
            self.inner.list().await
        }

        async fn get(&self, id: &str) -> Result<Option<Device>, StoreError> {
            let _open = self.gate.lock().await;
            self.inner.get(id).await
        }

        async fn create(&self, fields: DeviceFields) -> Result<Device, StoreError> {
            let _open = self.gate.lock().await;
            self.inner.create(fields).await
        }

        async fn update(&self, id: &str, fields: DeviceFields) -> Result<Device, StoreError> {
            let _open = self.gate.lock().await;
            self.inner.update(id, fields).await
        }

        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            let _open = self.gate.lock().await;
            self.inner.delete(id).await
        }
    }

    /// Helper to check a serial number against the add-form rules
    pub fn is_valid_serial_number(s: &str) -> bool {
        crate::validators::validate_serial_number(s).is_ok()
    }
}

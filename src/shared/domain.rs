use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Stock photo used when a device has no plant image of its own
pub const DEFAULT_PLANT_IMAGE: &str =
    "https://images.unsplash.com/photo-1614594975525-e45190c55d0b?w=400&h=400&fit=crop";

/// Firmware version pre-filled by the add-device form
pub const DEFAULT_FIRMWARE_VERSION: &str = "2.4.1";

/// Device record as persisted by the entity store
///
/// Every sensor field is optional on the wire. Missing values are resolved at
/// projection time, never here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_image: Option<String>,
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_intensity: Option<f64>,
    #[serde(default)]
    pub pump_status: PumpStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_health"
    )]
    pub health_status: Option<HealthStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reading: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watered: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

impl Device {
    /// Build a stored record from a submitted payload
    pub fn from_fields(id: String, created_date: DateTime<Utc>, fields: DeviceFields) -> Self {
        Self {
            id,
            plant_name: fields.plant_name,
            plant_species: fields.plant_species,
            plant_image: fields.plant_image,
            serial_number: fields.serial_number,
            location: fields.location,
            firmware_version: fields.firmware_version,
            status: fields.status,
            battery_level: fields.battery_level,
            soil_moisture: fields.soil_moisture,
            air_temperature: fields.air_temperature,
            air_humidity: fields.air_humidity,
            light_intensity: fields.light_intensity,
            pump_status: fields.pump_status,
            health_status: fields.health_status,
            created_by: fields.created_by,
            last_reading: fields.last_reading,
            last_watered: fields.last_watered,
            created_date: Some(created_date),
        }
    }

    /// Full-record replace. Identity, creation date and ownership stay with the
    /// stored record.
    pub fn replaced_with(&self, fields: DeviceFields) -> Self {
        let mut next = Self::from_fields(self.id.clone(), DateTime::<Utc>::default(), fields);
        next.created_date = self.created_date;
        next.created_by = self.created_by.clone();
        next
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.created_by.as_deref() == Some(email)
    }
}

/// Create/edit payload: every device field except the store-assigned ones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceFields {
    pub plant_name: Option<String>,
    pub plant_species: Option<String>,
    pub plant_image: Option<String>,
    pub serial_number: String,
    pub location: Option<String>,
    pub firmware_version: Option<String>,
    pub status: DeviceStatus,
    pub battery_level: Option<u8>,
    pub soil_moisture: Option<f64>,
    pub air_temperature: Option<f64>,
    pub air_humidity: Option<f64>,
    pub light_intensity: Option<f64>,
    pub pump_status: PumpStatus,
    pub health_status: Option<HealthStatus>,
    pub created_by: Option<String>,
    pub last_reading: Option<DateTime<Utc>>,
    pub last_watered: Option<DateTime<Utc>>,
}

impl Default for DeviceFields {
    /// Values the add-device form starts with
    fn default() -> Self {
        Self {
            plant_name: None,
            plant_species: None,
            plant_image: Some(DEFAULT_PLANT_IMAGE.to_string()),
            serial_number: String::new(),
            location: None,
            firmware_version: Some(DEFAULT_FIRMWARE_VERSION.to_string()),
            status: DeviceStatus::Online,
            battery_level: Some(95),
            soil_moisture: Some(65.0),
            air_temperature: Some(24.0),
            air_humidity: Some(60.0),
            light_intensity: Some(8500.0),
            pump_status: PumpStatus::Off,
            health_status: Some(HealthStatus::Good),
            created_by: None,
            last_reading: None,
            last_watered: None,
        }
    }
}

impl DeviceFields {
    /// Form defaults with the two fields the add form requires
    pub fn new(plant_name: impl Into<String>, serial_number: impl Into<String>) -> Self {
        Self {
            plant_name: Some(plant_name.into()),
            serial_number: serial_number.into(),
            ..Self::default()
        }
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.plant_species = Some(species.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Edit form pre-fill
impl From<&Device> for DeviceFields {
    fn from(device: &Device) -> Self {
        Self {
            plant_name: device.plant_name.clone(),
            plant_species: device.plant_species.clone(),
            plant_image: device.plant_image.clone(),
            serial_number: device.serial_number.clone(),
            location: device.location.clone(),
            firmware_version: device.firmware_version.clone(),
            status: device.status,
            battery_level: device.battery_level,
            soil_moisture: device.soil_moisture,
            air_temperature: device.air_temperature,
            air_humidity: device.air_humidity,
            light_intensity: device.light_intensity,
            pump_status: device.pump_status,
            health_status: device.health_status,
            created_by: device.created_by.clone(),
            last_reading: device.last_reading,
            last_watered: device.last_watered,
        }
    }
}

/// Connectivity status. Anything other than online/standby reads as offline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DeviceStatus {
    Online,
    Standby,
    #[default]
    Offline,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Standby => "standby",
            DeviceStatus::Offline => "offline",
        }
    }
}

impl From<String> for DeviceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "online" => DeviceStatus::Online,
            "standby" => DeviceStatus::Standby,
            _ => DeviceStatus::Offline,
        }
    }
}

/// Persisted pump state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum PumpStatus {
    On,
    #[default]
    Off,
}

impl PumpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PumpStatus::On => "on",
            PumpStatus::Off => "off",
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, PumpStatus::On)
    }

    pub fn flipped(&self) -> Self {
        match self {
            PumpStatus::On => PumpStatus::Off,
            PumpStatus::Off => PumpStatus::On,
        }
    }
}

impl From<String> for PumpStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "on" => PumpStatus::On,
            _ => PumpStatus::Off,
        }
    }
}

/// Plant health as recorded on the device
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Excellent,
        HealthStatus::Good,
        HealthStatus::Moderate,
        HealthStatus::Poor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Moderate => "moderate",
            HealthStatus::Poor => "poor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.as_str() == value)
    }
}

/// Unrecognized health values read as unreported
fn lenient_health<'de, D>(deserializer: D) -> Result<Option<HealthStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(HealthStatus::parse))
}

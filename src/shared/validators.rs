use regex::Regex;
use std::sync::OnceLock;

use crate::domain::DeviceFields;
use crate::error::error_codes;

pub const MAX_SERIAL_NUMBER_LEN: usize = 64;
pub const MAX_PLANT_NAME_LEN: usize = 128;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: &'static str,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: error_codes::INVALID_VALUE,
        }
    }

    /// A required field that is absent or blank
    pub fn missing(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: error_codes::MISSING_FIELD,
            ..Self::new(field, message)
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Validation error for field '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

/// Validate device serial number
/// Required, max 64 chars, printable ASCII only (e.g. PP-2024-A7B3C9D2)
pub fn validate_serial_number(serial_number: &str) -> Result<(), ValidationError> {
    if serial_number.trim().is_empty() {
        return Err(ValidationError::missing(
            "serial_number",
            "Device serial number is required",
        ));
    }

    if serial_number.len() > MAX_SERIAL_NUMBER_LEN {
        return Err(ValidationError::new(
            "serial_number",
            format!(
                "Serial number length {} exceeds maximum of {} characters",
                serial_number.len(),
                MAX_SERIAL_NUMBER_LEN
            ),
        ));
    }

    if !serial_number
        .chars()
        .all(|c| c.is_ascii() && (' '..='~').contains(&c))
    {
        return Err(ValidationError::new(
            "serial_number",
            "Serial number must contain only printable ASCII characters",
        ));
    }

    Ok(())
}

/// Validate plant name
/// The add form requires it; the stored record may still lack one
pub fn validate_plant_name(plant_name: Option<&str>) -> Result<(), ValidationError> {
    let name = plant_name.map(str::trim).unwrap_or_default();

    if name.is_empty() {
        return Err(ValidationError::missing("plant_name", "Plant name is required"));
    }

    if name.chars().count() > MAX_PLANT_NAME_LEN {
        return Err(ValidationError::new(
            "plant_name",
            format!(
                "Plant name exceeds maximum of {} characters",
                MAX_PLANT_NAME_LEN
            ),
        ));
    }

    Ok(())
}

/// Validate battery percentage (0-100 inclusive)
pub fn validate_battery_level(battery_level: Option<u8>) -> Result<(), ValidationError> {
    match battery_level {
        Some(level) if level > 100 => Err(ValidationError::new(
            "battery_level",
            format!("Battery level {} exceeds 100%", level),
        )),
        _ => Ok(()),
    }
}

/// Validate sensor readings are finite numbers when present
pub fn validate_readings(fields: &DeviceFields) -> Result<(), ValidationError> {
    let readings = [
        ("soil_moisture", fields.soil_moisture),
        ("air_temperature", fields.air_temperature),
        ("air_humidity", fields.air_humidity),
        ("light_intensity", fields.light_intensity),
    ];

    for (field, value) in readings {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(ValidationError::new(field, "Reading must be a finite number"));
            }
        }
    }

    Ok(())
}

/// Validate a create/edit payload before it is sent to the store
pub fn validate_device_fields(fields: &DeviceFields) -> Result<(), ValidationError> {
    validate_plant_name(fields.plant_name.as_deref())?;
    validate_serial_number(&fields.serial_number)?;
    validate_battery_level(fields.battery_level)?;
    validate_readings(fields)?;
    Ok(())
}

/// Validate avatar color format (#RRGGBB)
pub fn validate_avatar_color(color: &str) -> Result<(), ValidationError> {
    static COLOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COLOR_REGEX.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

    if regex.is_match(color) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "avatar_color",
            "Avatar color must be in format #RRGGBB",
        ))
    }
}

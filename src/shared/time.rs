use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Clock trait for abstracting time operations
pub trait Clock: Send + Sync {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;

    /// Current time as RFC3339 string, e.g. "2024-01-15T10:30:00+00:00"
    fn now_rfc3339(&self) -> String {
        self.now().to_rfc3339()
    }
}

/// Production implementation of Clock using system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test implementation of Clock with controllable time.
/// Interior mutability lets a shared `Arc<FixedClock>` be advanced mid-test.
#[derive(Debug)]
pub struct FixedClock {
    timestamp: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Mutex::new(timestamp),
        }
    }

    pub fn from_rfc3339(timestamp_str: &str) -> Result<Self, chrono::ParseError> {
        let timestamp = DateTime::parse_from_rfc3339(timestamp_str)?.with_timezone(&Utc);
        Ok(Self::new(timestamp))
    }

    pub fn set_time(&self, timestamp: DateTime<Utc>) {
        *self.lock() = timestamp;
    }

    pub fn advance(&self, by: Duration) {
        *self.lock() += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid timestamp
        self.timestamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Locale-dependent date rendering, kept behind a trait so views never
/// hard-code a format
pub trait DateFormatter: Send + Sync {
    /// Calendar date, e.g. "1/15/2024"
    fn format_date(&self, timestamp: &DateTime<Utc>) -> String;

    /// Date and time, e.g. "1/15/2024, 10:30:00 AM"
    fn format_datetime(&self, timestamp: &DateTime<Utc>) -> String;
}

/// US English formatting in UTC
#[derive(Debug, Clone, Default)]
pub struct UsDateFormatter;

impl DateFormatter for UsDateFormatter {
    fn format_date(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp.format("%-m/%-d/%Y").to_string()
    }

    fn format_datetime(&self, timestamp: &DateTime<Utc>) -> String {
        timestamp.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
    }
}

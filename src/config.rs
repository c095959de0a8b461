use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::path::PathBuf;
use std::time::Duration;

use plantpulse::UserSession;

/// Number of devices the mock source seeds when nothing else is configured
pub const DEFAULT_MOCK_DEVICE_COUNT: usize = 6;

/// Where the dashboard reads devices from
#[derive(Debug, Clone)]
pub enum StoreBackend {
    DynamoDb {
        client: DynamoDbClient,
        table: String,
    },
    Mock {
        device_count: usize,
    },
}

/// Configuration for the dashboard binary
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    /// Directory holding the session file
    pub session_dir: PathBuf,
    /// User to sign in when no session is stored
    pub sign_in_as: Option<UserSession>,
}

/// Environment values before any AWS client is built
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub devices_table: Option<String>,
    pub mock_device_count: usize,
    pub session_dir: PathBuf,
    pub sign_in_as: Option<UserSession>,
}

impl Settings {
    /// Parse settings from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mock_device_count = match non_empty("MOCK_DEVICE_COUNT") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                var: "MOCK_DEVICE_COUNT".to_string(),
                value: raw,
            })?,
            None => DEFAULT_MOCK_DEVICE_COUNT,
        };

        let sign_in_as = non_empty("PLANTPULSE_EMAIL").map(|email| UserSession {
            full_name: non_empty("PLANTPULSE_NAME").unwrap_or_default(),
            email,
            avatar_color: non_empty("PLANTPULSE_AVATAR_COLOR"),
        });

        Ok(Settings {
            devices_table: non_empty("DEVICES_TABLE"),
            mock_device_count,
            session_dir: non_empty("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            sign_in_as,
        })
    }
}

impl Config {
    /// Create a new Config instance from environment variables
    pub async fn from_env() -> Result<Self, ConfigError> {
        let settings = Settings::from_lookup(|key| std::env::var(key).ok())?;
        Ok(Self::from_settings(settings).await)
    }

    pub async fn from_settings(settings: Settings) -> Self {
        let backend = match settings.devices_table {
            Some(table) => StoreBackend::DynamoDb {
                client: dynamodb_client().await,
                table,
            },
            None => StoreBackend::Mock {
                device_count: settings.mock_device_count,
            },
        };

        Config {
            backend,
            session_dir: settings.session_dir,
            sign_in_as: settings.sign_in_as,
        }
    }
}

async fn dynamodb_client() -> DynamoDbClient {
    // Load AWS configuration with behavior version
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;

    let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&aws_config)
        .timeout_config(
            aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                .operation_timeout(Duration::from_secs(10))
                .operation_attempt_timeout(Duration::from_secs(5))
                .build(),
        )
        .build();

    DynamoDbClient::from_conf(dynamodb_config)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {value}")]
    InvalidValue { var: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.devices_table, None);
        assert_eq!(settings.mock_device_count, DEFAULT_MOCK_DEVICE_COUNT);
        assert_eq!(settings.session_dir, PathBuf::from("."));
        assert_eq!(settings.sign_in_as, None);
    }

    #[test]
    fn test_all_values() {
        let settings = Settings::from_lookup(lookup(&[
            ("DEVICES_TABLE", "plantpulse-devices"),
            ("MOCK_DEVICE_COUNT", "12"),
            ("SESSION_DIR", "/tmp/plantpulse"),
            ("PLANTPULSE_EMAIL", "ana@example.com"),
            ("PLANTPULSE_NAME", "Ana Lopez"),
        ]))
        .unwrap();

        assert_eq!(settings.devices_table.as_deref(), Some("plantpulse-devices"));
        assert_eq!(settings.mock_device_count, 12);
        assert_eq!(settings.session_dir, PathBuf::from("/tmp/plantpulse"));

        let user = settings.sign_in_as.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.full_name, "Ana Lopez");
        assert_eq!(user.avatar_color, None);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let settings =
            Settings::from_lookup(lookup(&[("DEVICES_TABLE", "  "), ("SESSION_DIR", "")]))
                .unwrap();
        assert_eq!(settings.devices_table, None);
        assert_eq!(settings.session_dir, PathBuf::from("."));
    }

    #[test]
    fn test_invalid_device_count() {
        let result = Settings::from_lookup(lookup(&[("MOCK_DEVICE_COUNT", "many")]));
        match result {
            Err(ConfigError::InvalidValue { var, value }) => {
                assert_eq!(var, "MOCK_DEVICE_COUNT");
                assert_eq!(value, "many");
            }
            other => panic!("Expected InvalidValue error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_backend_without_table() {
        let settings = Settings::from_lookup(lookup(&[("MOCK_DEVICE_COUNT", "3")])).unwrap();
        let config = Config::from_settings(settings).await;
        assert!(matches!(
            config.backend,
            StoreBackend::Mock { device_count: 3 }
        ));
    }
}

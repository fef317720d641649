use config::Config;
use error_stack::{report, ResultExt};
use thiserror::Error;

use super::{google_config::GoogleConfig, transfer_config::TransferConfig};

pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "Config";
pub const SERVICE_CREDENTIALS_VAR: &str = "GOOGLE_API_SERVICE_CREDENTIALS_PATH";
pub const OAUTH_CREDENTIALS_VAR: &str = "GOOGLE_OAUTH_CREDENTIALS_PATH";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Error reading config file '{0}'")]
    Read(String),
    #[error("Failed to deserialize config file '{0}'")]
    Deserialize(String),
    #[error("Missing credentials path: set {0}")]
    MissingCredentials(&'static str),
    #[error("Credentials file not found at {0}")]
    CredentialsNotFound(String),
}

#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct MenuConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for MenuConfig {
    fn default() -> Self {
        MenuConfig {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    20
}

#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Also write logs, without colors, to this file
    pub file: Option<Box<str>>,
}

impl AppConfig {
    /// Reads `Config.toml` (or the file named by `CONFIG_PATH`) when present, then lets the
    /// credential environment variables override the `google` section.
    pub fn load() -> error_stack::Result<AppConfig, ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let config = Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .set_override_option(
                "google.service_account_key",
                std::env::var(SERVICE_CREDENTIALS_VAR).ok(),
            )
            .and_then(|builder| {
                builder.set_override_option(
                    "google.oauth_client_secret",
                    std::env::var(OAUTH_CREDENTIALS_VAR).ok(),
                )
            })
            .and_then(|builder| builder.build())
            .map_err(|e| match e {
                config::ConfigError::NotFound(property) => {
                    report!(ConfigError::Read(config_path.clone()))
                        .attach_printable(format!("Missing property {:?}", property))
                }
                other => report!(ConfigError::Read(config_path.clone())).attach_printable(other.to_string()),
            })?;

        config
            .try_deserialize::<AppConfig>()
            .map_err(|e| report!(ConfigError::Deserialize(config_path.clone())).attach_printable(e.to_string()))
            .attach_printable("Make sure all fields in the configuration file have the expected types")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn from_toml(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = from_toml("");
        assert_eq!(config.transfer.batch_size, 50);
        assert_eq!(config.transfer.batch_delay_ms, 1000);
        assert_eq!(config.transfer.anchor, "Sheet1!A4");
        assert_eq!(config.transfer.clear_range, "Sheet1!A4:L");
        assert_eq!(config.menu.page_size, 20);
        assert!(config.google.service_account_key.is_none());
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = from_toml(
            r#"
            [google]
            service_account_key = "service.json"

            [transfer]
            batch_size = 10
            anchor = "Timeline!A2"

            [menu]
            page_size = 5
            "#,
        );
        assert_eq!(config.transfer.batch_size, 10);
        assert_eq!(config.transfer.batch_delay_ms, 1000);
        assert_eq!(config.transfer.anchor, "Timeline!A2");
        assert_eq!(config.menu.page_size, 5);
        assert_eq!(
            config.google.service_account_key.as_deref(),
            Some(std::path::Path::new("service.json"))
        );
    }

    #[test]
    fn test_load_reads_file_from_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[transfer]\nbatch_size = 7").unwrap();

        std::env::set_var(CONFIG_PATH_VAR, &path);
        let config = AppConfig::load();
        std::env::remove_var(CONFIG_PATH_VAR);

        assert_eq!(config.unwrap().transfer.batch_size, 7);
    }
}

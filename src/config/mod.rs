pub mod app_config;
pub mod google_config;
pub mod transfer_config;

pub use app_config::{AppConfig, ConfigError};

use std::path::{Path, PathBuf};

use error_stack::report;

use super::app_config::{ConfigError, OAUTH_CREDENTIALS_VAR, SERVICE_CREDENTIALS_VAR};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct GoogleConfig {
    /// Service account key (JSON) used for unattended Sheets and Drive calls
    pub service_account_key: Option<PathBuf>,
    /// OAuth client secret (JSON) used by the interactive flow
    pub oauth_client_secret: Option<PathBuf>,
    #[serde(default = "default_token_cache")]
    pub oauth_token_cache: PathBuf,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        GoogleConfig {
            service_account_key: None,
            oauth_client_secret: None,
            oauth_token_cache: default_token_cache(),
        }
    }
}

fn default_token_cache() -> PathBuf {
    PathBuf::from("oauth_tokens.json")
}

impl GoogleConfig {
    pub fn service_account_key(&self) -> error_stack::Result<&Path, ConfigError> {
        existing_file(self.service_account_key.as_deref(), SERVICE_CREDENTIALS_VAR)
    }

    pub fn oauth_client_secret(&self) -> error_stack::Result<&Path, ConfigError> {
        existing_file(self.oauth_client_secret.as_deref(), OAUTH_CREDENTIALS_VAR)
    }
}

fn existing_file<'a>(
    path: Option<&'a Path>,
    variable: &'static str,
) -> error_stack::Result<&'a Path, ConfigError> {
    let path = path.ok_or_else(|| report!(ConfigError::MissingCredentials(variable)))?;
    if !path.is_file() {
        return Err(report!(ConfigError::CredentialsNotFound(
            path.display().to_string()
        )));
    }
    Ok(path)
}

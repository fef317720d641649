use error_stack::ResultExt;
use google_sheets4::{
    hyper::client::HttpConnector,
    hyper_rustls::HttpsConnector,
    oauth2::{self, authenticator::Authenticator},
};
use thiserror::Error;
use tracing::instrument;

use super::http_client::HttpClient;
use crate::config::google_config::GoogleConfig;

pub type GoogleAuthenticator = Authenticator<HttpsConnector<HttpConnector>>;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Google credentials are not configured")]
    MissingCredentials,
    #[error("Could not read credentials file '{0}'")]
    ReadCredentials(String),
    #[error("Could not create an authenticator")]
    Build,
}

/// Unattended authentication with the configured service account key.
#[instrument(skip_all)]
pub async fn service_account(
    config: &GoogleConfig,
    client: HttpClient,
) -> error_stack::Result<GoogleAuthenticator, AuthError> {
    let key_path = config
        .service_account_key()
        .change_context(AuthError::MissingCredentials)?;

    let secret = oauth2::read_service_account_key(key_path)
        .await
        .change_context_lazy(|| AuthError::ReadCredentials(key_path.display().to_string()))
        .attach_printable("Please provide a valid service account private key")?;

    oauth2::ServiceAccountAuthenticator::with_client(secret, client)
        .build()
        .await
        .change_context(AuthError::Build)
}

/// Interactive OAuth consent through a local redirect. Tokens are cached on disk so the
/// browser round-trip only happens once.
#[instrument(skip_all)]
pub async fn installed_flow(
    config: &GoogleConfig,
    client: HttpClient,
) -> error_stack::Result<GoogleAuthenticator, AuthError> {
    let secret_path = config
        .oauth_client_secret()
        .change_context(AuthError::MissingCredentials)?;

    let secret = oauth2::read_application_secret(secret_path)
        .await
        .change_context_lazy(|| AuthError::ReadCredentials(secret_path.display().to_string()))?;

    let authenticator = oauth2::InstalledFlowAuthenticator::with_client(
        secret,
        oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        client,
    )
    .persist_tokens_to_disk(&config.oauth_token_cache)
    .build()
    .await
    .change_context(AuthError::Build)?;

    // Forces the consent screen now instead of on the first API call
    authenticator
        .token(&[DRIVE_SCOPE, SPREADSHEETS_SCOPE])
        .await
        .change_context(AuthError::Build)
        .attach_printable("OAuth consent was not completed")?;

    tracing::info!("OAuth authorization complete");
    Ok(authenticator)
}

//! Credential handling - turns configured secrets into an authorized API client

use crate::config::AuthConfig;
use crate::ingestion::error::ReportError;
use crate::ingestion::fetch::ReportingClient;
use tracing::{debug, info};
use yup_oauth2::{
    InstalledFlowAuthenticator, InstalledFlowReturnMethod, ServiceAccountAuthenticator,
};

/// Obtain an access token for the configured scope.
///
/// A service account key takes precedence; otherwise the installed-app flow
/// is used, with tokens cached on disk so only the first run prompts.
pub async fn access_token(auth: &AuthConfig) -> Result<String, ReportError> {
    let scopes = [auth.scope.as_str()];

    let token = match &auth.service_account_key {
        Some(key_path) => {
            debug!("Using service account key {:?}", key_path);
            let key = yup_oauth2::read_service_account_key(key_path)
                .await
                .map_err(|e| ReportError::Auth(format!("Failed to read service account key: {}", e)))?;

            let authenticator = ServiceAccountAuthenticator::builder(key)
                .persist_tokens_to_disk(&auth.token_cache)
                .build()
                .await
                .map_err(|e| ReportError::Auth(format!("Failed to create authenticator: {}", e)))?;

            authenticator.token(&scopes).await?
        }
        None => {
            debug!("Using installed-app flow with {:?}", auth.client_secrets);
            let secret = yup_oauth2::read_application_secret(&auth.client_secrets)
                .await
                .map_err(|e| ReportError::Auth(format!("Failed to read client secrets: {}", e)))?;

            let authenticator =
                InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
                    .persist_tokens_to_disk(&auth.token_cache)
                    .build()
                    .await
                    .map_err(|e| ReportError::Auth(format!("Failed to create authenticator: {}", e)))?;

            authenticator.token(&scopes).await?
        }
    };

    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| ReportError::CredentialsRevoked("token response had no access token".into()))
}

/// Authenticate and construct a client for the reporting API
pub async fn authorize(auth: &AuthConfig, base_url: &str) -> Result<ReportingClient, ReportError> {
    let token = access_token(auth).await?;
    info!("Authorized against {}", base_url);
    ReportingClient::new(base_url, token)
}

//! Utility functions for common operations

use crate::ingestion::error::ReportError;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::warn;

/// Google-style API error envelope: {"error": {"code": 401, "message": "..."}}
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Build the HTTP client used for every API call
pub fn http_client() -> Result<Client, ReportError> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(300)) // 5 min timeout, report downloads can be large
        .user_agent(concat!("campaign-reports/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ReportError::ConnectionFailed(format!("Failed to build HTTP client: {}", e)))
}

/// Pass successful responses through; turn everything else into a ReportError
pub async fn ensure_success(response: Response) -> Result<Response, ReportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body);
    warn!("Reporting API returned {}: {}", status.as_u16(), message);

    Err(classify_status(status, message))
}

/// Best-effort extraction of the human-readable message from an error body
pub fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn classify_status(status: StatusCode, message: String) -> ReportError {
    match status {
        StatusCode::UNAUTHORIZED => ReportError::CredentialsRevoked(message),
        _ => ReportError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

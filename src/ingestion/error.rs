//! Error type shared by every pipeline step

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    // ── Auth ──────────────────────────────────────────────────────────────
    #[error("The credentials have been revoked or expired, please re-run the application to re-authorize ({0})")]
    CredentialsRevoked(String),

    #[error("Authentication setup failed: {0}")]
    Auth(String),

    // ── API ───────────────────────────────────────────────────────────────
    #[error("Reporting API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // ── Report files ──────────────────────────────────────────────────────
    #[error("Report file {file_id} ended with status {status}")]
    FileFailed { file_id: String, status: String },

    #[error("Report file {file_id} not available after {attempts} status checks")]
    PollTimeout { file_id: String, attempts: u32 },

    // ── Local files ───────────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ReportError {
    /// True when the stored credential can no longer be used and the
    /// operator has to re-authorize before anything else can succeed.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ReportError::CredentialsRevoked(_))
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ReportError::MalformedResponse(error.to_string())
        } else {
            ReportError::ConnectionFailed(error.to_string())
        }
    }
}

impl From<yup_oauth2::Error> for ReportError {
    fn from(error: yup_oauth2::Error) -> Self {
        match error {
            // invalid_grant and friends: the refresh token is gone
            yup_oauth2::Error::AuthError(e) => ReportError::CredentialsRevoked(e.to_string()),
            other => ReportError::Auth(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        assert!(ReportError::CredentialsRevoked("401".into()).is_auth_failure());
        assert!(!ReportError::Auth("missing secrets".into()).is_auth_failure());
        assert!(!ReportError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_auth_failure());
        assert!(!ReportError::PollTimeout {
            file_id: "1".into(),
            attempts: 3
        }
        .is_auth_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = ReportError::FileFailed {
            file_id: "42".into(),
            status: "FAILED".into(),
        };
        assert_eq!(err.to_string(), "Report file 42 ended with status FAILED");

        let err = ReportError::PollTimeout {
            file_id: "42".into(),
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "Report file 42 not available after 5 status checks"
        );
    }
}

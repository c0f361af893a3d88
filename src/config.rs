//! Configuration loaded from environment variables (and `.env`)

use crate::ingestion::types::{CleanerLayout, PollPolicy};
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://dfareporting.googleapis.com/dfareporting/v4";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/dfareporting";

/// Where credentials come from
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub scope: String,
    pub client_secrets: PathBuf,
    pub token_cache: PathBuf,
    pub service_account_key: Option<PathBuf>, // takes precedence over client_secrets
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub auth: AuthConfig,
    pub profile_id: Option<String>,
    pub report_id: Option<String>,
    pub file_id: Option<String>,
    pub poll: PollPolicy,
    pub raw_report_path: PathBuf,
    pub cleaned_report_path: PathBuf,
    pub layout: CleanerLayout,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let poll = PollPolicy {
            max_attempts: parse_or(&get, "POLL_MAX_ATTEMPTS", 60u32)?,
            interval: Duration::from_secs(parse_or(&get, "POLL_INTERVAL_SECS", 10u64)?),
        };
        if poll.max_attempts == 0 {
            return Err(anyhow!("POLL_MAX_ATTEMPTS must be at least 1"));
        }

        Ok(Config {
            api_base_url: get("REPORTING_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),

            auth: AuthConfig {
                scope: get("REPORTING_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
                client_secrets: get("CLIENT_SECRETS_FILE")
                    .unwrap_or_else(|| "client_secrets.json".to_string())
                    .into(),
                token_cache: get("TOKEN_CACHE_FILE")
                    .unwrap_or_else(|| "dfareporting_tokens.json".to_string())
                    .into(),
                service_account_key: get("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            },

            profile_id: get("PROFILE_ID"),
            report_id: get("REPORT_ID"),
            file_id: get("REPORT_FILE_ID"),

            poll,

            raw_report_path: get("RAW_REPORT_PATH")
                .unwrap_or_else(|| "performance_report_data.csv".to_string())
                .into(),
            cleaned_report_path: get("CLEANED_REPORT_PATH")
                .unwrap_or_else(|| "reporting_data.csv".to_string())
                .into(),

            layout: CleanerLayout {
                header_row: parse_or(&get, "HEADER_ROW_INDEX", 10usize)?,
                // not filtered through `get`: an explicit empty value is meaningful
                colon_replacement: lookup("HEADER_COLON_REPLACEMENT").unwrap_or_default(),
            },
        })
    }

    pub fn require_profile_id(&self) -> Result<&str> {
        self.profile_id.as_deref().context("PROFILE_ID must be set")
    }

    pub fn require_report_id(&self) -> Result<&str> {
        self.report_id.as_deref().context("REPORT_ID must be set")
    }

    pub fn require_file_id(&self) -> Result<&str> {
        self.file_id.as_deref().context("REPORT_FILE_ID must be set")
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.auth.scope, DEFAULT_SCOPE);
        assert!(config.auth.service_account_key.is_none());
        assert_eq!(config.poll, PollPolicy::default());
        assert_eq!(config.raw_report_path, PathBuf::from("performance_report_data.csv"));
        assert_eq!(config.cleaned_report_path, PathBuf::from("reporting_data.csv"));
        assert_eq!(config.layout, CleanerLayout::default());
        assert!(config.profile_id.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PROFILE_ID", "1001"),
            ("REPORT_ID", "123"),
            ("POLL_MAX_ATTEMPTS", "5"),
            ("POLL_INTERVAL_SECS", "2"),
            ("HEADER_ROW_INDEX", "3"),
            ("HEADER_COLON_REPLACEMENT", "_"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/secrets/sa.json"),
        ])
        .unwrap();

        assert_eq!(config.require_profile_id().unwrap(), "1001");
        assert_eq!(config.require_report_id().unwrap(), "123");
        assert_eq!(config.poll.max_attempts, 5);
        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.layout.header_row, 3);
        assert_eq!(config.layout.colon_replacement, "_");
        assert_eq!(
            config.auth.service_account_key,
            Some(PathBuf::from("/secrets/sa.json"))
        );
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        let err = config_from(&[("POLL_MAX_ATTEMPTS", "many")]).unwrap_err();
        assert!(err.to_string().contains("POLL_MAX_ATTEMPTS"));

        assert!(config_from(&[("HEADER_ROW_INDEX", "-1")]).is_err());
        assert!(config_from(&[("POLL_MAX_ATTEMPTS", "0")]).is_err());
    }

    #[test]
    fn test_missing_ids() {
        let config = config_from(&[("PROFILE_ID", "  ")]).unwrap();

        assert!(config.require_profile_id().is_err());
        assert!(config.require_report_id().is_err());
        assert!(config.require_file_id().is_err());
    }
}

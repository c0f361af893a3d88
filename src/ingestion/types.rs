//! Core data types for the report pipeline
//! API-shaped records plus the small value types the pipeline passes around

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User profile - the account context reports are listed and run under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub profile_id: String,
    pub user_name: String,
    #[serde(default)]
    pub account_name: Option<String>,
}

/// Response body of the user profile listing
#[derive(Debug, Deserialize)]
pub struct UserProfileList {
    #[serde(default)]
    pub items: Vec<UserProfile>,
}

/// Report definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One page of the report listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportList {
    #[serde(default)]
    pub items: Vec<Report>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ReportList {
    /// Token for the following page, if the listing continues.
    /// An empty page ends the listing even when a token is present.
    pub fn continuation(&self) -> Option<&str> {
        if self.items.is_empty() {
            return None;
        }
        self.next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Report file lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Queued,
    Processing,
    ReportAvailable,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl FileStatus {
    /// Terminal states that will never become available
    pub fn is_failed(&self) -> bool {
        matches!(self, FileStatus::Failed | FileStatus::Cancelled)
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Queued => write!(f, "QUEUED"),
            FileStatus::Processing => write!(f, "PROCESSING"),
            FileStatus::ReportAvailable => write!(f, "REPORT_AVAILABLE"),
            FileStatus::Failed => write!(f, "FAILED"),
            FileStatus::Cancelled => write!(f, "CANCELLED"),
            FileStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Output artifact of a report run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFile {
    pub id: String,
    pub report_id: String,
    pub status: FileStatus,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<String>, // epoch millis, sent as a string
}

impl ReportFile {
    pub fn is_available(&self) -> bool {
        self.status == FileStatus::ReportAvailable
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        let millis = self.last_modified_time.as_deref()?.parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

/// How long to wait for a report file to become available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            max_attempts: 60,
            interval: Duration::from_secs(10),
        }
    }
}

/// Fixed-offset layout of a downloaded report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerLayout {
    /// Zero-based index of the header row; rows before it are preamble
    pub header_row: usize,
    /// Substituted for ':' in header fields
    pub colon_replacement: String,
}

impl Default for CleanerLayout {
    fn default() -> Self {
        CleanerLayout {
            header_row: 10,
            colon_replacement: String::new(),
        }
    }
}

/// Clean operation statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanStats {
    pub preamble_skipped: usize,
    pub header_written: bool,
    pub body_rows: usize,
}

impl std::fmt::Display for CleanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "preamble skipped: {}, header: {}, body rows: {}",
            self.preamble_skipped,
            if self.header_written { "yes" } else { "no" },
            self.body_rows
        )
    }
}

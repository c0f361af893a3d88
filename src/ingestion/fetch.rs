//! Fetch functions - talk to the reporting API and pull the report file to disk

use crate::ingestion::error::ReportError;
use crate::ingestion::types::{
    PollPolicy, Report, ReportFile, ReportList, UserProfile, UserProfileList,
};
use crate::ingestion::utils::{ensure_success, http_client};
use crate::ingestion::write::write_download;
use bytes::Bytes;
use reqwest::Client;
use std::path::Path;
use tracing::{debug, info};

/// Client for one authorized session against the reporting API
#[derive(Clone)]
pub struct ReportingClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl ReportingClient {
    pub fn new(base_url: &str, access_token: String) -> Result<Self, ReportError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// List every user profile visible to the credential
    pub async fn list_profiles(&self) -> Result<Vec<UserProfile>, ReportError> {
        let url = format!("{}/userprofiles", self.base_url);
        debug!("GET /userprofiles");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let list: UserProfileList = response.json().await?;
        for profile in &list.items {
            info!(
                "Found user profile with ID {} and user name {}.",
                profile.profile_id, profile.user_name
            );
        }

        Ok(list.items)
    }

    /// List every report for a profile, following continuation tokens
    pub async fn list_reports(&self, profile_id: &str) -> Result<Vec<Report>, ReportError> {
        let url = format!("{}/userprofiles/{}/reports", self.base_url, profile_id);

        let mut reports = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let mut request = self.client.get(&url).bearer_auth(&self.access_token);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            debug!("GET /userprofiles/{}/reports (page {})", profile_id, pages + 1);
            let response = ensure_success(request.send().await?).await?;
            let page: ReportList = response.json().await?;
            pages += 1;

            for report in &page.items {
                info!(
                    "Found {} report with ID {} and name {}.",
                    report.kind, report.id, report.name
                );
            }

            page_token = page.continuation().map(str::to_string);
            reports.extend(page.items);

            if page_token.is_none() {
                break;
            }
        }

        info!("Listed {} reports across {} pages", reports.len(), pages);
        Ok(reports)
    }

    /// Start a run of the report, returning the file it will produce
    pub async fn run_report(
        &self,
        profile_id: &str,
        report_id: &str,
    ) -> Result<ReportFile, ReportError> {
        let url = format!(
            "{}/userprofiles/{}/reports/{}/run",
            self.base_url, profile_id, report_id
        );
        debug!("POST /userprofiles/{}/reports/{}/run", profile_id, report_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let file: ReportFile = response.json().await?;
        info!("Running report file with ID {}.", file.id);
        Ok(file)
    }

    /// Current state of a report file
    pub async fn get_file(&self, report_id: &str, file_id: &str) -> Result<ReportFile, ReportError> {
        let url = format!("{}/reports/{}/files/{}", self.base_url, report_id, file_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        Ok(response.json().await?)
    }

    /// Poll a report file until it is available, within the policy's bounds
    pub async fn wait_for_file(
        &self,
        report_id: &str,
        file_id: &str,
        policy: &PollPolicy,
    ) -> Result<ReportFile, ReportError> {
        for attempt in 1..=policy.max_attempts {
            let file = self.get_file(report_id, file_id).await?;
            info!(
                "Current status: {} (check {}/{})",
                file.status, attempt, policy.max_attempts
            );

            if file.is_available() {
                return Ok(file);
            }
            if file.status.is_failed() {
                return Err(ReportError::FileFailed {
                    file_id: file_id.to_string(),
                    status: file.status.to_string(),
                });
            }

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.interval).await;
            }
        }

        Err(ReportError::PollTimeout {
            file_id: file_id.to_string(),
            attempts: policy.max_attempts,
        })
    }

    /// Download the contents of a report file to `output_path`, replacing it
    pub async fn download_file(
        &self,
        report_id: &str,
        file_id: &str,
        output_path: &Path,
    ) -> Result<u64, ReportError> {
        let url = format!("{}/reports/{}/files/{}", self.base_url, report_id, file_id);
        debug!("GET /reports/{}/files/{}?alt=media", report_id, file_id);

        let response = self
            .client
            .get(&url)
            .query(&[("alt", "media")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: Bytes = response.bytes().await?;
        let written = write_download(output_path, &body)?;
        info!("Report download complete! ({} bytes to {:?})", written, output_path);

        Ok(written)
    }

    /// Run a report, wait for its file, and download it
    pub async fn run_report_to_file(
        &self,
        profile_id: &str,
        report_id: &str,
        policy: &PollPolicy,
        output_path: &Path,
    ) -> Result<ReportFile, ReportError> {
        let started = self.run_report(profile_id, report_id).await?;
        let ready = self.wait_for_file(report_id, &started.id, policy).await?;
        self.download_file(report_id, &ready.id, output_path).await?;
        Ok(ready)
    }
}

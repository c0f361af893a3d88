//! Report workflow - authenticate, pick profile and report, run it, download the file

use anyhow::{Context, Result};
use campaign_reports::ingestion::auth;
use campaign_reports::{Config, ReportError};
use std::env;
use tracing::{error, info, warn};

const DEFAULT_STEPS: [&str; 3] = ["profiles", "reports", "run"];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Connecting to the DCM/DFA Reporting API ...");

    let config = Config::from_env()?;
    info!("Configuration loaded");

    // Steps to run come from the command line, or the whole workflow
    let args: Vec<String> = env::args().skip(1).collect();
    let steps = if args.is_empty() {
        DEFAULT_STEPS.iter().map(|s| s.to_string()).collect()
    } else {
        args
    };

    for step in steps {
        info!("Running step: {}", step);

        let result = match step.as_str() {
            "profiles" => list_profiles(&config).await,
            "reports" => list_reports(&config).await,
            "run" => run_report(&config).await,
            "download" => download_file(&config).await,
            _ => {
                warn!("Unknown step: {}", step);
                continue;
            }
        };

        // A failed step leaves nothing for the next one to work with
        if let Err(e) = result {
            // logged once here; returning the error would print it again
            report_failure(&step, &e);
            std::process::exit(1);
        }
        info!("✓ {} completed", step);
    }

    info!("Report workflow complete");

    Ok(())
}

async fn list_profiles(config: &Config) -> Result<()> {
    let client = auth::authorize(&config.auth, &config.api_base_url).await?;
    let profiles = client.list_profiles().await?;
    info!("Found {} user profiles", profiles.len());

    match &config.profile_id {
        Some(id) => info!("Profile ID {} selected.", id),
        None => warn!("No PROFILE_ID configured; pick one of the profiles above"),
    }
    Ok(())
}

async fn list_reports(config: &Config) -> Result<()> {
    let profile_id = config.require_profile_id()?;

    let client = auth::authorize(&config.auth, &config.api_base_url).await?;
    let reports = client.list_reports(profile_id).await?;

    match &config.report_id {
        Some(id) if reports.iter().any(|r| &r.id == id) => info!("Report ID {} selected.", id),
        Some(id) => warn!("Report ID {} selected but not listed for profile {}", id, profile_id),
        None => warn!("No REPORT_ID configured; pick one of the reports above"),
    }
    Ok(())
}

async fn run_report(config: &Config) -> Result<()> {
    let profile_id = config.require_profile_id()?;
    let report_id = config.require_report_id()?;

    let client = auth::authorize(&config.auth, &config.api_base_url).await?;
    let file = client
        .run_report_to_file(profile_id, report_id, &config.poll, &config.raw_report_path)
        .await
        .with_context(|| format!("Report {} did not produce a file", report_id))?;

    if let Some(modified) = file.last_modified() {
        info!("Report file {} generated at {}", file.id, modified);
    }
    info!("Set REPORT_FILE_ID={} to download this file again", file.id);
    Ok(())
}

async fn download_file(config: &Config) -> Result<()> {
    let report_id = config.require_report_id()?;
    let file_id = config.require_file_id()?;

    let client = auth::authorize(&config.auth, &config.api_base_url).await?;
    client
        .download_file(report_id, file_id, &config.raw_report_path)
        .await?;
    Ok(())
}

fn report_failure(step: &str, err: &anyhow::Error) {
    if is_auth_failure(err) {
        error!("✗ {} failed: the credentials have been revoked or expired, please re-run the application to re-authorize", step);
    } else {
        error!("✗ {} failed: {:#}", step, err);
    }
}

fn is_auth_failure(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ReportError>())
        .any(ReportError::is_auth_failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_found_through_context() {
        let err = anyhow::Error::from(ReportError::CredentialsRevoked("expired".into()))
            .context("Report 123 did not produce a file");
        assert!(is_auth_failure(&err));

        let err = anyhow::Error::from(ReportError::PollTimeout {
            file_id: "987".into(),
            attempts: 3,
        })
        .context("Report 123 did not produce a file");
        assert!(!is_auth_failure(&err));

        assert!(!is_auth_failure(&anyhow::anyhow!("PROFILE_ID must be set")));
    }
}

//! CSV cleaner - strips the report preamble and totals row from a downloaded report

use anyhow::{Context, Result};
use campaign_reports::ingestion::parse::clean_report_file;
use campaign_reports::Config;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    info!(
        "Header expected at row {} of {:?}",
        config.layout.header_row, config.raw_report_path
    );

    let stats = clean_report_file(
        &config.raw_report_path,
        &config.cleaned_report_path,
        &config.layout,
    )
    .with_context(|| format!("Failed to clean {:?}", config.raw_report_path))?;

    info!("✓ Wrote {:?} ({})", config.cleaned_report_path, stats);

    Ok(())
}

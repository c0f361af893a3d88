// Library module for testable functions

pub mod config;
pub mod ingestion;

pub use config::Config;
pub use ingestion::fetch::ReportingClient;
pub use ingestion::ReportError;

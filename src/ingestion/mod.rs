//! Report ingestion - functional pipeline from the reporting API to a clean CSV

pub mod auth;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod types;
pub mod utils;
pub mod write;

pub use error::ReportError;
pub use types::*;

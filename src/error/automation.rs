use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Invalid control URL '{url}': {source}")]
    InvalidControlUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to '{endpoint}' failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Coordinator was not ready after {attempts} attempt(s).")]
    CoordinatorUnavailable { attempts: u32 },
    #[error("Locust cannot be started (status {status}). Please check logs!")]
    RunStartRejected { status: u16 },
    #[error("Report directory '{path}' already exists.")]
    ReportDirExists { path: PathBuf },
    #[error("Failed to create report directory '{path}': {source}")]
    CreateReportDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write report '{path}': {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Automated run was cancelled by a shutdown signal.")]
    Cancelled,
}

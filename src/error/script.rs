use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Resolved script path is empty.")]
    EmptyScript,
    #[error("'{path}' is not a python file.")]
    UnsupportedFormat { path: PathBuf },
    #[error("Invalid S3 locator '{locator}'. Expected s3://bucket/key.")]
    InvalidS3Locator { locator: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("'{location}' was not found.")]
    NotFound { location: String },
    #[error("Request for '{location}' failed: {source}")]
    Network {
        location: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("'{location}' answered with unexpected status {status}.")]
    UnexpectedStatus { location: String, status: u16 },
    #[error("Cannot derive a file name from '{location}'.")]
    MissingFileName { location: String },
    #[error("Object storage rejected '{location}' with status {status}: {message}")]
    Storage {
        location: String,
        status: u16,
        message: String,
    },
    #[error("Object storage request for '{location}' failed: {source}")]
    ObjectStorage {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use reqwest::StatusCode;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::FetchError;

use super::{FetchSettings, S3Object, ScriptFetcher};

/// Storage error bodies are truncated to this many characters in messages.
const STORAGE_MESSAGE_LIMIT: usize = 256;
/// Used when neither the settings nor the AWS region chain provide a region.
const FALLBACK_REGION: &str = "us-east-1";
const CREDENTIALS_SOURCE: &str = "locust-bootstrap";
/// Highest `name (n).py` suffix tried before a download gives up.
const MAX_NAME_SUFFIX: u32 = 999;

/// Fetches scripts over HTTP(S) and from S3.
pub struct RemoteFetcher {
    http: reqwest::Client,
    settings: FetchSettings,
}

impl RemoteFetcher {
    /// Builds the fetcher and its HTTP client. The S3 client is created on
    /// first use so local and HTTP scripts never consult the AWS chains.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::BuildClient { source: err })?;
        Ok(Self { http, settings })
    }

    async fn s3_client(&self) -> Result<S3Client, FetchError> {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(self.settings.request_timeout)
            .build();
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeouts);
        if let Some(region) = &self.settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(credentials) = &self.settings.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &credentials.access_key_id,
                &credentials.secret_access_key,
                credentials.session_token.clone(),
                None,
                CREDENTIALS_SOURCE,
            ));
        }
        if let Some(endpoint) = &self.settings.s3_endpoint {
            Url::parse(endpoint).map_err(|err| FetchError::InvalidUrl {
                url: endpoint.clone(),
                source: err,
            })?;
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let mut builder = S3ConfigBuilder::from(&shared);
        if shared.region().is_none() {
            debug!("No AWS region configured, using {}", FALLBACK_REGION);
            builder = builder.region(Region::new(FALLBACK_REGION));
        }
        if self.settings.s3_endpoint.is_some() {
            builder = builder.force_path_style(true);
        }
        Ok(S3Client::from_conf(builder.build()))
    }

    async fn write_script(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, FetchError> {
        let (mut file, path) = create_unclaimed(&self.settings.download_dir, file_name).await?;
        let written = match file.write_all(bytes).await {
            Ok(()) => file.flush().await,
            Err(err) => Err(err),
        };
        written.map_err(|err| FetchError::Write {
            path: path.clone(),
            source: err,
        })?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

#[async_trait]
impl ScriptFetcher for RemoteFetcher {
    async fn fetch_s3(&self, object: &S3Object) -> Result<PathBuf, FetchError> {
        let location = format!("s3://{}/{}", object.bucket, object.key);
        let file_name = object.file_name();
        if file_name.is_empty() {
            return Err(FetchError::MissingFileName { location });
        }

        let client = self.s3_client().await?;
        debug!("Fetching {}", location);
        let output = client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return FetchError::NotFound {
                        location: location.clone(),
                    };
                }
                match err.raw_response().map(|response| response.status().as_u16()) {
                    Some(404) => FetchError::NotFound {
                        location: location.clone(),
                    },
                    Some(status) => FetchError::Storage {
                        location: location.clone(),
                        status,
                        message: DisplayErrorContext(&err)
                            .to_string()
                            .chars()
                            .take(STORAGE_MESSAGE_LIMIT)
                            .collect(),
                    },
                    None => FetchError::ObjectStorage {
                        location: location.clone(),
                        source: Box::new(err),
                    },
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| FetchError::ObjectStorage {
                location: location.clone(),
                source: Box::new(err),
            })?;
        self.write_script(file_name, &body.into_bytes()).await
    }

    async fn fetch_http(&self, url: &Url) -> Result<PathBuf, FetchError> {
        let location = url.to_string();
        let file_name = url_file_name(url).ok_or_else(|| FetchError::MissingFileName {
            location: location.clone(),
        })?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| FetchError::Network {
                location: location.clone(),
                source: err,
            })?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { location });
        }
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                location,
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(|err| FetchError::Network {
            location: location.clone(),
            source: err,
        })?;
        self.write_script(&file_name, &bytes).await
    }
}

/// Last non-empty path segment, excluding relative components.
pub(super) fn url_file_name(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_owned())
}

/// `load.py`, then `load (1).py`, `load (2).py` and so on. The extension stays
/// last so numbered copies still pass script validation.
pub(super) fn numbered_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_owned();
    }
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            format!("{} ({}).{}", stem, attempt, extension)
        }
        _ => format!("{} ({})", file_name, attempt),
    }
}

/// Creates the first free numbered variant of `file_name` in `dir`. Existing
/// files are never overwritten.
async fn create_unclaimed(dir: &Path, file_name: &str) -> Result<(File, PathBuf), FetchError> {
    for attempt in 0..=MAX_NAME_SUFFIX {
        let path = dir.join(numbered_name(file_name, attempt));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => {
                if attempt > 0 {
                    info!(
                        "{} already exists, saving download as {}",
                        file_name,
                        path.display()
                    );
                }
                return Ok((file, path));
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(FetchError::Write { path, source: err }),
        }
    }
    Err(FetchError::Write {
        path: dir.join(file_name),
        source: std::io::Error::from(ErrorKind::AlreadyExists),
    })
}

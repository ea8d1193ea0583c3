//! Locust script resolution: S3 objects, HTTP(S) downloads, or local files.
mod remote;
mod source;


use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};
use url::Url;

use crate::args::SCRIPT_EXTENSION;
use crate::error::{AppError, AppResult, ConfigError, FetchError, ScriptError};

pub use remote::RemoteFetcher;
pub use source::{S3Object, ScriptSource};

/// Settings shared by the remote fetchers.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Directory downloaded scripts are written to.
    pub download_dir: PathBuf,
    /// Region override; the AWS region provider chain decides when unset.
    pub region: Option<String>,
    /// Path-style endpoint override for S3-compatible stores.
    pub s3_endpoint: Option<String>,
    /// Static keys; the AWS default credential chain is used when unset.
    pub credentials: Option<S3Credentials>,
    pub request_timeout: Duration,
}

#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Retrieves remote scripts into a local file.
#[async_trait]
pub trait ScriptFetcher {
    async fn fetch_s3(&self, object: &S3Object) -> Result<PathBuf, FetchError>;

    async fn fetch_http(&self, url: &Url) -> Result<PathBuf, FetchError>;
}

/// Resolves a script locator to a local, runnable Locust script.
///
/// # Errors
///
/// Returns a configuration error for an empty locator, a fetch error for
/// fatal retrieval failures, and a script error when the resolved path is
/// empty or not a python file.
pub async fn resolve_script<TFetcher>(locator: &str, fetcher: &TFetcher) -> AppResult<PathBuf>
where
    TFetcher: ScriptFetcher + Sync,
{
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(AppError::config(ConfigError::MissingOption {
            key: "LOCUST_FILE",
        }));
    }

    let source = ScriptSource::parse(locator)?;
    let path = locate_script(source, fetcher).await?;
    validate_script_path(&path)?;
    Ok(path)
}

/// Fetches the script when needed. Missing objects and failed downloads are
/// logged and leave the path empty so validation rejects it.
pub(crate) async fn locate_script<TFetcher>(
    source: ScriptSource,
    fetcher: &TFetcher,
) -> Result<PathBuf, ScriptError>
where
    TFetcher: ScriptFetcher + Sync,
{
    match source {
        ScriptSource::S3(object) => {
            info!("Load test script from s3 bucket {}", object.bucket);
            match fetcher.fetch_s3(&object).await {
                Ok(path) => Ok(path),
                Err(FetchError::NotFound { location }) => {
                    error!("File cannot be found! ({})", location);
                    Ok(PathBuf::new())
                }
                Err(err) => Err(err.into()),
            }
        }
        ScriptSource::Http(url) => {
            info!("Load test script from http or https url");
            match fetcher.fetch_http(&url).await {
                Ok(path) => Ok(path),
                Err(FetchError::NotFound { location }) => {
                    error!("File cannot be found! ({})", location);
                    Ok(PathBuf::new())
                }
                Err(
                    err @ (FetchError::Network { .. }
                    | FetchError::UnexpectedStatus { .. }
                    | FetchError::MissingFileName { .. }),
                ) => {
                    error!("File cannot be downloaded! Please check given url! ({})", err);
                    Ok(PathBuf::new())
                }
                Err(err) => Err(err.into()),
            }
        }
        ScriptSource::Local(path) => {
            info!("Load test script from local machine");
            Ok(path)
        }
    }
}

pub(crate) fn validate_script_path(path: &Path) -> Result<(), ScriptError> {
    if path.as_os_str().is_empty() {
        error!("File is empty");
        return Err(ScriptError::EmptyScript);
    }
    if !path.to_string_lossy().ends_with(SCRIPT_EXTENSION) {
        error!("It is not a python file! ({})", path.display());
        return Err(ScriptError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

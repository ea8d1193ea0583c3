use std::path::PathBuf;

use url::Url;

use crate::error::{FetchError, ScriptError};

const S3_PREFIX: &str = "s3://";

/// Where a script locator points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    S3(S3Object),
    Http(Url),
    Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Object {
    pub bucket: String,
    pub key: String,
}

impl S3Object {
    /// Local file name: the last segment of the key.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(self.key.as_str())
    }
}

impl ScriptSource {
    /// Classifies a locator by prefix.
    ///
    /// # Errors
    ///
    /// Returns an error when an `s3://` locator lacks a bucket or key, or an
    /// HTTP locator is not a valid URL.
    pub fn parse(locator: &str) -> Result<Self, ScriptError> {
        if let Some(rest) = locator.strip_prefix(S3_PREFIX) {
            let Some((bucket, key)) = rest.split_once('/') else {
                return Err(ScriptError::InvalidS3Locator {
                    locator: locator.to_owned(),
                });
            };
            if bucket.is_empty() || key.is_empty() {
                return Err(ScriptError::InvalidS3Locator {
                    locator: locator.to_owned(),
                });
            }
            return Ok(ScriptSource::S3(S3Object {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            }));
        }

        if locator.starts_with("http://") || locator.starts_with("https://") {
            let url = Url::parse(locator).map_err(|err| FetchError::InvalidUrl {
                url: locator.to_owned(),
                source: err,
            })?;
            return Ok(ScriptSource::Http(url));
        }

        Ok(ScriptSource::Local(PathBuf::from(locator)))
    }
}

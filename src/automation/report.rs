use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AutomationError;

pub(crate) const REPORT_FILE: &str = "reports.html";

/// Creates the report directory. An existing directory is an error so an
/// earlier report is never overwritten.
pub(crate) async fn create_report_dir(dir: &Path) -> Result<(), AutomationError> {
    tokio::fs::create_dir(dir).await.map_err(|err| {
        if err.kind() == ErrorKind::AlreadyExists {
            AutomationError::ReportDirExists {
                path: dir.to_path_buf(),
            }
        } else {
            AutomationError::CreateReportDir {
                path: dir.to_path_buf(),
                source: err,
            }
        }
    })
}

pub(crate) async fn write_report(dir: &Path, body: &[u8]) -> Result<PathBuf, AutomationError> {
    let path = dir.join(REPORT_FILE);
    tokio::fs::write(&path, body)
        .await
        .map_err(|err| AutomationError::WriteReport {
            path: path.clone(),
            source: err,
        })?;
    info!("Report saved to {} ({} bytes)", path.display(), body.len());
    Ok(path)
}

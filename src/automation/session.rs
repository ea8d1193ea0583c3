use std::path::PathBuf;
use std::time::Duration;

use crate::args::ReadinessPolicy;

/// Parameters of one automated run against a remote coordinator.
#[derive(Debug, Clone)]
pub struct RunSession {
    /// `http://<master host>:<port>`
    pub control_url: String,
    pub users: u64,
    pub hatch_rate: u64,
    pub duration: Duration,
    pub retry: RetryPolicy,
    pub readiness: ReadinessPolicy,
    /// Must not exist yet; created right before the report is fetched.
    pub report_dir: PathBuf,
    pub request_timeout: Duration,
}

/// Readiness polling: `attempts` probes, each preceded by `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

/// How an automated session ended without an error.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { report_path: PathBuf },
    /// Readiness polling was exhausted and the policy is `ignore`.
    CoordinatorUnavailable,
}

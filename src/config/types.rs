use serde::Deserialize;

use crate::args::{ReadinessPolicy, Role};
use crate::automation::RunSession;
use crate::script::FetchSettings;

/// Optional file-based configuration. Values only fill keys that were not
/// given on the command line or through the environment.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub role: Option<String>,
    pub target_host: Option<String>,
    pub locust_file: Option<String>,
    pub master_host: Option<String>,
    pub master_port: Option<u16>,
    pub slave_mul: Option<ConfigValue>,
    pub automatic: Option<bool>,
    pub users: Option<ConfigValue>,
    pub hatch_rate: Option<ConfigValue>,
    pub duration: Option<ConfigValue>,
    pub locust_bin: Option<String>,
    pub report_dir: Option<String>,
    pub poll_attempts: Option<u32>,
    pub poll_interval: Option<ConfigValue>,
    pub readiness_failure: Option<ReadinessPolicy>,
    pub request_timeout: Option<ConfigValue>,
    pub aws_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

/// Numbers may be written bare or quoted; both go through the same validation
/// as environment values.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(u64),
    Text(String),
}

impl ConfigValue {
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            ConfigValue::Number(value) => value.to_string(),
            ConfigValue::Text(value) => value,
        }
    }
}

/// Validated launch parameters for one role.
#[derive(Debug)]
pub enum LaunchConfig {
    Coordinator(CoordinatorConfig),
    Worker(WorkerConfig),
    Controller(ControllerConfig),
}

impl LaunchConfig {
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            LaunchConfig::Coordinator(_) => Role::Coordinator,
            LaunchConfig::Worker(_) => Role::Worker,
            LaunchConfig::Controller(_) => Role::Controller,
        }
    }
}

/// How the Locust engine is invoked and where scripts come from.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub locust_bin: String,
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub target_host: String,
    pub locust_file: String,
    pub engine: EngineConfig,
}

#[derive(Debug)]
pub struct WorkerConfig {
    pub target_host: String,
    pub locust_file: String,
    pub master_host: String,
    pub workers: WorkerCount,
    pub engine: EngineConfig,
}

/// Number of slave processes requested through `SLAVE_MUL`.
#[derive(Debug)]
pub enum WorkerCount {
    Default(usize),
    Explicit(usize),
    /// The raw value could not be used; no slaves are started.
    Invalid {
        raw: String,
        error: crate::error::ValidationError,
    },
}

impl WorkerCount {
    #[must_use]
    pub const fn count(&self) -> usize {
        match self {
            WorkerCount::Default(count) | WorkerCount::Explicit(count) => *count,
            WorkerCount::Invalid { .. } => 0,
        }
    }
}

#[derive(Debug)]
pub struct ControllerConfig {
    /// `None` when `AUTOMATIC` is false.
    pub session: Option<RunSession>,
}

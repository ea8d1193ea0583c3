use std::path::PathBuf;

use url::Url;

use crate::args::parsers::{parse_duration_arg, parse_positive_u64, parse_positive_usize};
use crate::args::{BootstrapArgs, Role, default_worker_count};
use crate::automation::{RetryPolicy, RunSession};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::script::{FetchSettings, S3Credentials};

use super::types::{
    ControllerConfig, CoordinatorConfig, EngineConfig, LaunchConfig, WorkerConfig, WorkerCount,
};

/// Reads a required key; unset and empty values are both missing.
fn require(value: Option<&str>, key: &'static str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(AppError::config(ConfigError::MissingOption { key })),
    }
}

fn invalid(key: &'static str) -> impl FnOnce(ValidationError) -> AppError {
    move |source| AppError::config(ConfigError::InvalidValue { key, source })
}

/// Validates the role and every parameter it requires. Nothing is spawned or
/// contacted before this succeeds.
///
/// # Errors
///
/// Returns a configuration error for a missing or invalid required value and a
/// validation error for an unknown role.
pub fn build_launch_config(args: &BootstrapArgs) -> AppResult<LaunchConfig> {
    let role: Role = require(args.role.as_deref(), "ROLE")?
        .parse()
        .map_err(AppError::validation)?;

    match role {
        Role::Coordinator => {
            let target_host = require(args.target_host.as_deref(), "TARGET_HOST")?;
            let locust_file = require(args.locust_file.as_deref(), "LOCUST_FILE")?;
            Ok(LaunchConfig::Coordinator(CoordinatorConfig {
                target_host,
                locust_file,
                engine: build_engine_config(args)?,
            }))
        }
        Role::Worker => {
            let target_host = require(args.target_host.as_deref(), "TARGET_HOST")?;
            let locust_file = require(args.locust_file.as_deref(), "LOCUST_FILE")?;
            let master_host = require(args.master_host.as_deref(), "MASTER_HOST")?;
            Ok(LaunchConfig::Worker(WorkerConfig {
                target_host,
                locust_file,
                master_host,
                workers: resolve_worker_count(args.slave_mul.as_deref()),
                engine: build_engine_config(args)?,
            }))
        }
        Role::Controller => {
            let session = if args.automatic {
                Some(build_run_session(args)?)
            } else {
                None
            };
            Ok(LaunchConfig::Controller(ControllerConfig { session }))
        }
    }
}

pub(crate) fn resolve_worker_count(raw: Option<&str>) -> WorkerCount {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return WorkerCount::Default(default_worker_count());
    };
    match parse_positive_usize(raw) {
        Ok(count) => WorkerCount::Explicit(count),
        Err(err) => WorkerCount::Invalid {
            raw: raw.to_owned(),
            error: err,
        },
    }
}

fn build_engine_config(args: &BootstrapArgs) -> AppResult<EngineConfig> {
    let locust_bin = require(Some(args.locust_bin.as_str()), "LOCUST_BIN")?;
    let download_dir = std::env::current_dir()?;
    let credentials = match (
        args.aws_access_key_id.as_deref(),
        args.aws_secret_access_key.as_deref(),
    ) {
        (Some(access_key_id), Some(secret_access_key)) => Some(S3Credentials {
            access_key_id: access_key_id.to_owned(),
            secret_access_key: secret_access_key.to_owned(),
            session_token: args.aws_session_token.clone(),
        }),
        _ => None,
    };
    Ok(EngineConfig {
        locust_bin,
        fetch: FetchSettings {
            download_dir,
            region: args.aws_region.clone(),
            s3_endpoint: args.s3_endpoint.clone(),
            credentials,
            request_timeout: args.request_timeout,
        },
    })
}

fn build_run_session(args: &BootstrapArgs) -> AppResult<RunSession> {
    let master_host = require(args.master_host.as_deref(), "MASTER_HOST")?;
    let control_url =
        control_url(&master_host, args.master_port).map_err(invalid("MASTER_HOST"))?;
    let users = parse_positive_u64(&require(args.users.as_deref(), "USERS")?)
        .map_err(invalid("USERS"))?;
    let hatch_rate = parse_positive_u64(&require(args.hatch_rate.as_deref(), "HATCH_RATE")?)
        .map_err(invalid("HATCH_RATE"))?;
    let duration = parse_duration_arg(&require(args.duration.as_deref(), "DURATION")?)
        .map_err(invalid("DURATION"))?;
    let report_dir = PathBuf::from(require(Some(args.report_dir.as_str()), "REPORT_DIR")?);
    let report_dir = if report_dir.is_absolute() {
        report_dir
    } else {
        std::env::current_dir()?.join(report_dir)
    };

    Ok(RunSession {
        control_url,
        users,
        hatch_rate,
        duration,
        retry: RetryPolicy {
            attempts: args.poll_attempts,
            interval: args.poll_interval,
        },
        readiness: args.readiness_failure,
        report_dir,
        request_timeout: args.request_timeout,
    })
}

/// Web UI address of the master. The host has to survive URL parsing
/// unchanged, so schemes, ports, paths and credentials are rejected.
pub(crate) fn control_url(master_host: &str, port: u16) -> Result<String, ValidationError> {
    let url = format!("http://{}:{}", master_host, port);
    let invalid = || ValidationError::InvalidHost {
        value: master_host.to_owned(),
    };
    let parsed = Url::parse(&url).map_err(|_| invalid())?;
    let same_host = parsed
        .host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(master_host));
    if !same_host
        || parsed.port_or_known_default() != Some(port)
        || parsed.path() != "/"
        || parsed.query().is_some()
        || parsed.fragment().is_some()
        || !parsed.username().is_empty()
    {
        return Err(invalid());
    }
    Ok(url)
}

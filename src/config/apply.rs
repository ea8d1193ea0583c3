use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::BootstrapArgs;
use crate::args::parsers::{parse_duration_arg, parse_positive_u32};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Command line and environment both outrank the config file.
fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn fill(target: &mut Option<String>, matches: &ArgMatches, name: &str, value: Option<String>) {
    if !is_explicit(matches, name)
        && let Some(value) = value
    {
        *target = Some(value);
    }
}

/// Applies config file values to arguments that were not set explicitly.
///
/// # Errors
///
/// Returns an error when a config value fails validation.
pub fn apply_config(
    args: &mut BootstrapArgs,
    matches: &ArgMatches,
    config: ConfigFile,
) -> AppResult<()> {
    fill(&mut args.role, matches, "role", config.role);
    fill(&mut args.target_host, matches, "target_host", config.target_host);
    fill(&mut args.locust_file, matches, "locust_file", config.locust_file);
    fill(&mut args.master_host, matches, "master_host", config.master_host);
    fill(
        &mut args.slave_mul,
        matches,
        "slave_mul",
        config.slave_mul.map(|value| value.into_text()),
    );
    fill(
        &mut args.users,
        matches,
        "users",
        config.users.map(|value| value.into_text()),
    );
    fill(
        &mut args.hatch_rate,
        matches,
        "hatch_rate",
        config.hatch_rate.map(|value| value.into_text()),
    );
    fill(
        &mut args.duration,
        matches,
        "duration",
        config.duration.map(|value| value.into_text()),
    );
    fill(&mut args.s3_endpoint, matches, "s3_endpoint", config.s3_endpoint);

    if !is_explicit(matches, "master_port")
        && let Some(port) = config.master_port
    {
        args.master_port = port;
    }

    if !is_explicit(matches, "automatic")
        && let Some(automatic) = config.automatic
    {
        args.automatic = automatic;
    }

    if !is_explicit(matches, "locust_bin")
        && let Some(bin) = config.locust_bin
    {
        args.locust_bin = bin;
    }

    if !is_explicit(matches, "report_dir")
        && let Some(dir) = config.report_dir
    {
        args.report_dir = dir;
    }

    fill(&mut args.aws_region, matches, "aws_region", config.aws_region);

    if !is_explicit(matches, "readiness_failure")
        && let Some(policy) = config.readiness_failure
    {
        args.readiness_failure = policy;
    }

    if !is_explicit(matches, "poll_attempts")
        && let Some(attempts) = config.poll_attempts
    {
        args.poll_attempts = parse_positive_u32(&attempts.to_string()).map_err(|err| {
            AppError::config(ConfigError::InvalidValue {
                key: "POLL_ATTEMPTS",
                source: err,
            })
        })?;
    }

    if !is_explicit(matches, "poll_interval")
        && let Some(interval) = config.poll_interval
    {
        args.poll_interval = parse_duration_arg(&interval.into_text()).map_err(|err| {
            AppError::config(ConfigError::InvalidValue {
                key: "POLL_INTERVAL",
                source: err,
            })
        })?;
    }

    if !is_explicit(matches, "request_timeout")
        && let Some(timeout) = config.request_timeout
    {
        args.request_timeout = parse_duration_arg(&timeout.into_text()).map_err(|err| {
            AppError::config(ConfigError::InvalidValue {
                key: "REQUEST_TIMEOUT",
                source: err,
            })
        })?;
    }

    Ok(())
}

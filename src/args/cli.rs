use clap::Parser;
use std::time::Duration;

use super::defaults::{
    DEFAULT_CONTROL_PORT, DEFAULT_LOCUST_BIN, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL,
    DEFAULT_REPORT_DIR, DEFAULT_REQUEST_TIMEOUT,
};
use super::parsers::{parse_bool_env, parse_duration_arg, parse_positive_u32};
use super::types::ReadinessPolicy;

/// Every option doubles as an environment variable so the binary can be used
/// as a container entrypoint without any flags.
#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Role-based bootstrap for Locust load-testing clusters - launches coordinator and worker processes and drives automated runs over the control API."
)]
pub struct BootstrapArgs {
    /// Role of this node: master, slave, or controller
    #[arg(long, env = "ROLE")]
    pub role: Option<String>,

    /// Host under test, passed to every Locust process
    #[arg(long = "target-host", env = "TARGET_HOST")]
    pub target_host: Option<String>,

    /// Locust script: s3://bucket/key, http(s):// URL, or local path
    #[arg(long = "locust-file", env = "LOCUST_FILE")]
    pub locust_file: Option<String>,

    /// Host of the Locust master (worker and controller roles)
    #[arg(long = "master-host", env = "MASTER_HOST")]
    pub master_host: Option<String>,

    /// Port of the master web/control API
    #[arg(long = "master-port", env = "MASTER_PORT", default_value_t = DEFAULT_CONTROL_PORT)]
    pub master_port: u16,

    /// Number of slave processes to start (defaults to 2 x CPUs + 1)
    #[arg(long = "slave-mul", env = "SLAVE_MUL")]
    pub slave_mul: Option<String>,

    /// Drive an automated run from the controller role
    #[arg(long = "automatic", env = "AUTOMATIC", value_parser = parse_bool_env)]
    pub automatic: bool,

    /// Number of simulated users for the automated run
    #[arg(long = "users", env = "USERS")]
    pub users: Option<String>,

    /// Users spawned per second for the automated run
    #[arg(long = "hatch-rate", env = "HATCH_RATE")]
    pub hatch_rate: Option<String>,

    /// Duration of the automated run (seconds, or ms/s/m/h suffix)
    #[arg(long = "duration", env = "DURATION")]
    pub duration: Option<String>,

    /// Locust executable used for master and slave processes
    #[arg(long = "locust-bin", env = "LOCUST_BIN", default_value = DEFAULT_LOCUST_BIN)]
    pub locust_bin: String,

    /// Directory the HTML report is written to (must not exist yet)
    #[arg(long = "report-dir", env = "REPORT_DIR", default_value = DEFAULT_REPORT_DIR)]
    pub report_dir: String,

    /// Readiness probes sent to the master before giving up
    #[arg(
        long = "poll-attempts",
        env = "POLL_ATTEMPTS",
        default_value_t = DEFAULT_POLL_ATTEMPTS,
        value_parser = parse_positive_u32
    )]
    pub poll_attempts: u32,

    /// Delay before each readiness probe (supports ms/s/m/h)
    #[arg(
        long = "poll-interval",
        env = "POLL_INTERVAL",
        default_value = DEFAULT_POLL_INTERVAL,
        value_parser = parse_duration_arg
    )]
    pub poll_interval: Duration,

    /// What to do when the master never becomes ready
    #[arg(
        long = "readiness-failure",
        env = "READINESS_FAILURE",
        default_value = "fail",
        ignore_case = true
    )]
    pub readiness_failure: ReadinessPolicy,

    /// Timeout for each control API or download request (supports ms/s/m/h)
    #[arg(
        long = "request-timeout",
        env = "REQUEST_TIMEOUT",
        default_value = DEFAULT_REQUEST_TIMEOUT,
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// S3 region; the AWS default region chain applies when unset
    #[arg(long = "aws-region", env = "AWS_REGION")]
    pub aws_region: Option<String>,

    /// Override the S3 endpoint (path-style addressing)
    #[arg(long = "s3-endpoint", env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS access key for S3 script downloads
    #[arg(long = "aws-access-key-id", env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    /// AWS secret key for S3 script downloads
    #[arg(
        long = "aws-secret-access-key",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true
    )]
    pub aws_secret_access_key: Option<String>,

    /// AWS session token for S3 script downloads
    #[arg(long = "aws-session-token", env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub aws_session_token: Option<String>,

    /// Path to a TOML or JSON config file
    #[arg(long = "config", env = "BOOTSTRAP_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}

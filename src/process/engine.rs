use std::fmt;
use std::path::Path;

use super::ProcessKind;

const LOG_LEVEL: &str = "debug";

/// A fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub kind: ProcessKind,
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// `<bin> -H <target> --loglevel debug --master -f <script>`
#[must_use]
pub fn coordinator_command(locust_bin: &str, target_host: &str, script: &Path) -> LaunchCommand {
    let mut args = common_args(target_host);
    args.push("--master".to_owned());
    args.push("-f".to_owned());
    args.push(script.display().to_string());
    LaunchCommand {
        kind: ProcessKind::Coordinator,
        program: locust_bin.to_owned(),
        args,
    }
}

/// `<bin> -H <target> --loglevel debug --slave -f <script> --master-host <master>`
#[must_use]
pub fn worker_command(
    locust_bin: &str,
    target_host: &str,
    script: &Path,
    master_host: &str,
) -> LaunchCommand {
    let mut args = common_args(target_host);
    args.push("--slave".to_owned());
    args.push("-f".to_owned());
    args.push(script.display().to_string());
    args.push("--master-host".to_owned());
    args.push(master_host.to_owned());
    LaunchCommand {
        kind: ProcessKind::Worker,
        program: locust_bin.to_owned(),
        args,
    }
}

fn common_args(target_host: &str) -> Vec<String> {
    vec![
        "-H".to_owned(),
        target_host.to_owned(),
        "--loglevel".to_owned(),
        LOG_LEVEL.to_owned(),
    ]
}

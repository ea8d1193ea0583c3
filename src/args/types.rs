use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Role assigned to this node for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Locust master: web UI, control API, aggregation.
    Coordinator,
    /// Pool of Locust slaves generating load.
    Worker,
    /// Drives an automated run against a remote master.
    Controller,
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "master" | "coordinator" => Ok(Role::Coordinator),
            "slave" | "worker" => Ok(Role::Worker),
            "controller" | "automation-controller" => Ok(Role::Controller),
            _ => Err(ValidationError::InvalidRole {
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Coordinator => "master",
            Role::Worker => "slave",
            Role::Controller => "controller",
        };
        f.write_str(name)
    }
}

/// Outcome of an automated session whose master never answered the probe.
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessPolicy {
    /// Exit with an automation failure.
    Fail,
    /// Log and finish normally.
    Ignore,
}

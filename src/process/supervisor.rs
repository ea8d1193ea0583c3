use std::fmt;
use std::process::Stdio;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, ProcessError};
use crate::shutdown::ShutdownReceiver;

use super::LaunchCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    Coordinator,
    Worker,
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessKind::Coordinator => write!(f, "master"),
            ProcessKind::Worker => write!(f, "slave"),
        }
    }
}

/// A spawned engine process owned by the supervisor.
#[derive(Debug)]
pub struct ManagedProcess {
    pub kind: ProcessKind,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    child: Child,
}

/// Owns every spawned child. The registry is append-only; children are
/// killed when the supervisor observes a shutdown or is dropped.
#[derive(Debug, Clone, Default)]
pub struct ProcessSupervisor {
    registry: Arc<Mutex<Vec<ManagedProcess>>>,
}

impl ProcessSupervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a child with inherited stdout/stderr and registers it.
    ///
    /// # Errors
    ///
    /// Returns an error when the program cannot be started.
    pub async fn spawn(&self, command: &LaunchCommand) -> AppResult<u32> {
        debug!("Spawning {}", command);
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                AppError::process(ProcessError::Spawn {
                    program: command.program.clone(),
                    source: err,
                })
            })?;
        let pid = child.id().unwrap_or_default();
        info!("Started {} process (pid {})", command.kind, pid);

        self.registry.lock().await.push(ManagedProcess {
            kind: command.kind,
            pid,
            started_at: Utc::now(),
            child,
        });
        Ok(pid)
    }

    pub async fn len(&self) -> usize {
        self.registry.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.lock().await.is_empty()
    }

    /// Force-kills every registered child. Already-exited children are
    /// skipped, so repeated calls are harmless.
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        if registry.is_empty() {
            debug!("No processes to kill");
            return;
        }
        info!("Killing {} process(es)", registry.len());
        for process in registry.iter_mut() {
            match process.child.try_wait() {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(err) => {
                    warn!("Failed to poll process {}: {}", process.pid, err);
                }
            }
            if let Err(err) = process.child.start_kill() {
                debug!("Process {} could not be killed: {}", process.pid, err);
            }
        }
    }

    /// Waits for every registered child in spawn order.
    ///
    /// # Errors
    ///
    /// Returns an error when the exit status of a child cannot be collected.
    pub async fn wait_all(&self) -> AppResult<()> {
        let mut registry = self.registry.lock().await;
        for process in registry.iter_mut() {
            let status = process.child.wait().await.map_err(|err| {
                AppError::process(ProcessError::Wait {
                    pid: process.pid,
                    source: err,
                })
            })?;
            let uptime = Utc::now().signed_duration_since(process.started_at);
            info!(
                "{} process (pid {}) exited with {} after {}s",
                process.kind,
                process.pid,
                status,
                uptime.num_seconds()
            );
        }
        Ok(())
    }

    /// Blocks until every child has exited. A shutdown signal kills all
    /// children first.
    ///
    /// # Errors
    ///
    /// Returns an error when waiting on a child fails.
    pub async fn supervise(&self, mut shutdown_rx: ShutdownReceiver) -> AppResult<()> {
        tokio::select! {
            result = self.wait_all() => result,
            _ = shutdown_rx.recv() => {
                self.shutdown().await;
                self.wait_all().await
            }
        }
    }
}

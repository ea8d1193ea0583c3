//! Drives a remote Locust master through its web control API: wait for it to
//! come up, start a swarm, let it run, stop it and download the HTML report.
mod control;
mod report;
mod session;

#[cfg(test)]
mod tests;

use std::time::Duration;

use tracing::{error, info, warn};

use crate::args::ReadinessPolicy;
use crate::error::{AppError, AppResult, AutomationError};
use crate::shutdown::ShutdownReceiver;

pub use control::{CoordinatorControl, HttpCoordinator};
pub use session::{RetryPolicy, RunSession, SessionOutcome};

const fn is_success(status: u16) -> bool {
    matches!(status, 200..=299)
}

/// Runs one automated session to completion.
///
/// # Errors
///
/// Returns an automation error when the coordinator never becomes ready under
/// the `fail` policy, the run cannot be started, a shutdown signal cancels
/// the run, or the report cannot be stored.
pub async fn run_automated_session<TControl>(
    session: &RunSession,
    control: &TControl,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<SessionOutcome>
where
    TControl: CoordinatorControl + Sync,
{
    if !wait_until_ready(control, session.retry, shutdown_rx).await? {
        return match session.readiness {
            ReadinessPolicy::Fail => {
                error!(
                    "Locust master at {} is not reachable after {} attempt(s)",
                    session.control_url, session.retry.attempts
                );
                Err(AppError::automation(
                    AutomationError::CoordinatorUnavailable {
                        attempts: session.retry.attempts,
                    },
                ))
            }
            ReadinessPolicy::Ignore => {
                warn!(
                    "Locust master at {} is not reachable, giving up",
                    session.control_url
                );
                Ok(SessionOutcome::CoordinatorUnavailable)
            }
        };
    }

    start_run(session, control).await?;

    info!("Running load test for {}s", session.duration.as_secs_f64());
    if !pause(session.duration, shutdown_rx).await {
        warn!("Shutdown requested during the run, stopping Locust");
        stop_run(control).await;
        return Err(AppError::automation(AutomationError::Cancelled));
    }
    stop_run(control).await;

    let report_path = download_report(session, control).await?;
    Ok(SessionOutcome::Completed { report_path })
}

/// Probes the master up to `retry.attempts` times, sleeping `retry.interval`
/// before each probe. Returns whether it answered with a success status.
async fn wait_until_ready<TControl>(
    control: &TControl,
    retry: RetryPolicy,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<bool>
where
    TControl: CoordinatorControl + Sync,
{
    for attempt in 1..=retry.attempts {
        if !pause(retry.interval, shutdown_rx).await {
            return Err(AppError::automation(AutomationError::Cancelled));
        }
        match control.probe().await {
            Ok(status) if is_success(status) => {
                info!("Locust master is ready (attempt {})", attempt);
                return Ok(true);
            }
            Ok(status) => {
                info!(
                    "Attempt {}: Locust master is not ready yet (status {})",
                    attempt, status
                );
            }
            Err(err) => {
                info!("Attempt {}: Locust master is not ready yet ({})", attempt, err);
            }
        }
    }
    Ok(false)
}

async fn start_run<TControl>(session: &RunSession, control: &TControl) -> AppResult<()>
where
    TControl: CoordinatorControl + Sync,
{
    match control.start(session.users, session.hatch_rate).await {
        Ok(status) if is_success(status) => {
            info!(
                "Locust started with {} users at hatch rate {}",
                session.users, session.hatch_rate
            );
            Ok(())
        }
        Ok(status) => {
            error!("Locust cannot be started (status {}). Please check logs!", status);
            stop_run(control).await;
            Err(AppError::automation(AutomationError::RunStartRejected {
                status,
            }))
        }
        Err(err) => {
            error!("Locust cannot be started: {}", err);
            stop_run(control).await;
            Err(AppError::automation(err))
        }
    }
}

/// Best effort; the outcome is only logged.
async fn stop_run<TControl>(control: &TControl)
where
    TControl: CoordinatorControl + Sync,
{
    match control.stop().await {
        Ok(status) if is_success(status) => info!("Locust stopped"),
        Ok(status) => warn!("Stop request answered with status {}", status),
        Err(err) => warn!("Stop request failed: {}", err),
    }
}

async fn download_report<TControl>(
    session: &RunSession,
    control: &TControl,
) -> AppResult<std::path::PathBuf>
where
    TControl: CoordinatorControl + Sync,
{
    report::create_report_dir(&session.report_dir).await?;
    let (status, body) = control.report().await?;
    if !is_success(status) {
        warn!("Report request answered with status {}", status);
    }
    Ok(report::write_report(&session.report_dir, &body).await?)
}

/// Sleeps for `duration`; returns `false` if a shutdown arrived first.
async fn pause(duration: Duration, shutdown_rx: &mut ShutdownReceiver) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => true,
        _ = shutdown_rx.recv() => false,
    }
}

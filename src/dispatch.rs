use tracing::{error, info};

use crate::automation::{HttpCoordinator, SessionOutcome, run_automated_session};
use crate::config::{
    ControllerConfig, CoordinatorConfig, LaunchConfig, WorkerConfig, WorkerCount,
};
use crate::error::{AppError, AppResult};
use crate::process::{ProcessSupervisor, coordinator_command, worker_command};
use crate::script::{RemoteFetcher, resolve_script};
use crate::shutdown::ShutdownReceiver;

/// Runs the launch strategy for the configured role. Coordinator and worker
/// processes are left running in `supervisor`; the caller waits for them.
///
/// # Errors
///
/// Returns an error when the script cannot be resolved, a process cannot be
/// spawned, or the automated session fails.
pub async fn dispatch(
    config: LaunchConfig,
    supervisor: &ProcessSupervisor,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<()> {
    info!("Bootstrapping node as {}", config.role());
    match config {
        LaunchConfig::Coordinator(config) => launch_coordinator(config, supervisor).await,
        LaunchConfig::Worker(config) => launch_workers(config, supervisor).await,
        LaunchConfig::Controller(config) => run_controller(config, shutdown_rx).await,
    }
}

async fn launch_coordinator(
    config: CoordinatorConfig,
    supervisor: &ProcessSupervisor,
) -> AppResult<()> {
    let fetcher = RemoteFetcher::new(config.engine.fetch).map_err(AppError::fetch)?;
    let script = resolve_script(&config.locust_file, &fetcher).await?;
    info!("Starting Locust master against {}", config.target_host);
    let command = coordinator_command(&config.engine.locust_bin, &config.target_host, &script);
    supervisor.spawn(&command).await?;
    Ok(())
}

async fn launch_workers(config: WorkerConfig, supervisor: &ProcessSupervisor) -> AppResult<()> {
    let fetcher = RemoteFetcher::new(config.engine.fetch).map_err(AppError::fetch)?;
    let script = resolve_script(&config.locust_file, &fetcher).await?;

    if let WorkerCount::Invalid { raw, error: err } = &config.workers {
        error!("Invalid SLAVE_MUL '{}': {}. No slaves are started", raw, err);
        return Ok(());
    }

    let count = config.workers.count();
    info!(
        "Starting {} Locust slave(s) for master {}",
        count, config.master_host
    );
    let command = worker_command(
        &config.engine.locust_bin,
        &config.target_host,
        &script,
        &config.master_host,
    );
    for _ in 0..count {
        supervisor.spawn(&command).await?;
    }
    Ok(())
}

async fn run_controller(
    config: ControllerConfig,
    shutdown_rx: &mut ShutdownReceiver,
) -> AppResult<()> {
    let Some(session) = config.session else {
        info!("Automatic mode is disabled, nothing to do");
        return Ok(());
    };

    info!("Controlling Locust master at {}", session.control_url);
    let control = HttpCoordinator::new(&session.control_url, session.request_timeout)?;
    match run_automated_session(&session, &control, shutdown_rx).await? {
        SessionOutcome::Completed { report_path } => {
            info!("Load test finished, report at {}", report_path.display());
        }
        SessionOutcome::CoordinatorUnavailable => {
            info!("Load test was not run");
        }
    }
    Ok(())
}

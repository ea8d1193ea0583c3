use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::{debug, info};

use crate::args::BootstrapArgs;
use crate::config::{LaunchConfig, apply_config, build_launch_config, load_config};
use crate::dispatch::dispatch;
use crate::error::AppResult;
use crate::logger::init_logging;
use crate::process::ProcessSupervisor;
use crate::shutdown_handlers::{setup_signal_shutdown_handler, shutdown_channel};

/// Parses configuration, validates it for the selected role and runs the
/// role to completion.
///
/// # Errors
///
/// Returns the first configuration, script, process or automation error.
pub fn run() -> AppResult<()> {
    let (mut args, matches) = parse_args()?;
    init_logging(args.verbose, args.no_color);

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, config)?;
    }
    let launch = build_launch_config(&args)?;
    debug!("Launch configuration: {:?}", launch);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(launch))
}

fn parse_args() -> AppResult<(BootstrapArgs, ArgMatches)> {
    let matches = BootstrapArgs::command().get_matches_from(std::env::args_os());
    let args = BootstrapArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

async fn run_async(launch: LaunchConfig) -> AppResult<()> {
    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let supervisor = ProcessSupervisor::new();

    let result = match dispatch(launch, &supervisor, &mut shutdown_rx).await {
        Ok(()) => supervisor.supervise(shutdown_rx).await,
        Err(err) => {
            supervisor.shutdown().await;
            Err(err)
        }
    };

    signal_handle.abort();
    if result.is_ok() {
        info!("All processes finished");
    }
    result
}

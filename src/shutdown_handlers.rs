use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::shutdown::{ShutdownReceiver, ShutdownSender, ShutdownSignal};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// One pending notification is enough; every subscriber only needs to see it once.
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<()>(SHUTDOWN_CHANNEL_CAPACITY)
}

/// Resolves with the first termination signal delivered to the bootstrap.
/// A failed Ctrl+C registration never resolves.
async fn termination_signal() -> ShutdownSignal {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let terminate = async {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    warn!("Failed to register SIGTERM handler: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::select! {
            () = interrupt => ShutdownSignal::Interrupt,
            () = terminate => ShutdownSignal::Terminate,
        }
    }

    #[cfg(not(unix))]
    {
        interrupt.await;
        ShutdownSignal::Interrupt
    }
}

/// Broadcasts a shutdown when SIGTERM or Ctrl+C arrives, so running Locust
/// processes and an automated session are stopped. The task yields the
/// signal it forwarded, or `None` when a shutdown was broadcast elsewhere.
pub fn setup_signal_shutdown_handler(
    shutdown_tx: &ShutdownSender,
) -> tokio::task::JoinHandle<Option<ShutdownSignal>> {
    let shutdown_tx = shutdown_tx.clone();
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_rx.recv() => None,
            received = termination_signal() => {
                info!("Received {}, stopping Locust processes", received);
                drop(shutdown_tx.send(()));
                Some(received)
            }
        }
    })
}

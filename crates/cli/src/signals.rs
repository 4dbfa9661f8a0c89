use flume::Sender;
use tokio::signal::unix::{SignalKind, signal};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// SIGINT or SIGTERM.
    Shutdown,
    /// SIGUSR1: run the configured mode once, outside the schedule.
    RunNow,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to install signal handler: {0}")]
    Install(#[from] std::io::Error),

    #[error("Signal event receiver dropped")]
    ReceiverDropped,
}

/// Forward process signals to `tx` until the receiver goes away.
pub async fn wait_for_signal(tx: Sender<SignalEvent>) -> Result<(), Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    loop {
        let event = tokio::select! {
            _ = sigint.recv() => SignalEvent::Shutdown,
            _ = sigterm.recv() => SignalEvent::Shutdown,
            _ = sigusr1.recv() => SignalEvent::RunNow,
        };
        debug!(?event, "signal received");
        tx.send_async(event)
            .await
            .map_err(|_| Error::ReceiverDropped)?;
    }
}

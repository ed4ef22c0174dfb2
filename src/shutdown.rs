//! Termination signal handling

use log::{error, info};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

/// How long exit waits for blocking work, such as a hung sensor read
pub const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Single-threaded runtime the daemon runs on
pub fn build_runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Shut the runtime down without waiting indefinitely on stuck blocking tasks
pub fn shutdown_runtime(runtime: Runtime) {
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
}

/// Resolve once SIGINT (Ctrl-C) or, on unix, SIGTERM arrives.
pub async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT, exiting...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, exiting...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, exiting...");
    }

    Ok(())
}

/// Cancel `cancel` when a termination signal arrives.
///
/// The listener only flips the token; the control loop owns everything else.
pub fn spawn_signal_listener(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = shutdown_signal() => match result {
                Ok(()) => cancel.cancel(),
                Err(e) => error!("Failed to install signal handlers: {}", e),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_exits_when_token_cancelled() {
        let cancel = CancellationToken::new();
        let handle = spawn_signal_listener(cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::shutdown::{ShutdownReceiver, ShutdownSender};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Broadcast channel size for shutdown notifications (single signal fan-out).
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<()>(SHUTDOWN_CHANNEL_CAPACITY)
}

/// Forward Ctrl+C (and SIGTERM on unix) into the shutdown channel.
///
/// The task also exits once anyone else sends on the channel.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();

        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, stopping run");
                    drop(shutdown_tx.send(()));
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    info!("SIGTERM received, stopping run");
                    drop(shutdown_tx.send(()));
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, stopping run");
                    drop(shutdown_tx.send(()));
                }
            }
        }
    })
}

/// Send shutdown once `deadline` has elapsed, unless shutdown happens first.
pub fn spawn_deadline_timer(
    deadline: Duration,
    shutdown_tx: ShutdownSender,
) -> tokio::task::JoinHandle<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_rx.recv() => {}
            () = tokio::time::sleep(deadline) => {
                warn!("Run deadline of {:?} exceeded, aborting", deadline);
                drop(shutdown_tx.send(()));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    const SIGNAL_HANDLER_SETTLE: Duration = Duration::from_millis(10);
    const SHUTDOWN_HANDLER_TIMEOUT: Duration = Duration::from_secs(1);

    fn run_async_test<F>(future: F) -> Result<(), String>
    where
        F: Future<Output = Result<(), String>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        runtime.block_on(future)
    }

    #[test]
    fn signal_handler_exits_on_shutdown() -> Result<(), String> {
        run_async_test(async {
            let (shutdown_tx, _) = shutdown_channel();
            let handle = setup_signal_shutdown_handler(&shutdown_tx);

            tokio::time::sleep(SIGNAL_HANDLER_SETTLE).await;
            if shutdown_tx.send(()).is_err() {
                return Err("Failed to send shutdown".to_owned());
            }

            tokio::time::timeout(SHUTDOWN_HANDLER_TIMEOUT, handle)
                .await
                .map_err(|err| format!("Timed out waiting for shutdown handler: {}", err))?
                .map_err(|err| format!("Shutdown task join error: {}", err))?;
            Ok(())
        })
    }

    #[test]
    fn deadline_timer_sends_shutdown() -> Result<(), String> {
        run_async_test(async {
            let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
            let started = tokio::time::Instant::now();
            let handle = spawn_deadline_timer(Duration::from_secs(3), shutdown_tx.clone());

            shutdown_rx
                .recv()
                .await
                .map_err(|err| format!("Shutdown not received: {}", err))?;
            if started.elapsed() < Duration::from_secs(3) {
                return Err(format!("Deadline fired early after {:?}", started.elapsed()));
            }
            handle
                .await
                .map_err(|err| format!("Deadline task join error: {}", err))?;
            Ok(())
        })
    }

    #[test]
    fn deadline_timer_stands_down_on_earlier_shutdown() -> Result<(), String> {
        run_async_test(async {
            let (shutdown_tx, _) = shutdown_channel();
            let handle = spawn_deadline_timer(Duration::from_secs(60), shutdown_tx.clone());

            tokio::time::sleep(SIGNAL_HANDLER_SETTLE).await;
            if shutdown_tx.send(()).is_err() {
                return Err("Failed to send shutdown".to_owned());
            }
            let started = tokio::time::Instant::now();
            tokio::time::timeout(SHUTDOWN_HANDLER_TIMEOUT, handle)
                .await
                .map_err(|err| format!("Timed out waiting for deadline task: {}", err))?
                .map_err(|err| format!("Deadline task join error: {}", err))?;
            if started.elapsed() >= Duration::from_secs(60) {
                return Err("Deadline task waited for the full deadline".to_owned());
            }
            Ok(())
        })
    }
}

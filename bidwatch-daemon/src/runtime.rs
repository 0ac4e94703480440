use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use bidwatch_core::WatcherConfig;

use crate::error::DaemonError;
use crate::orchestrator::Orchestrator;

/// Start the watcher runtime and block the current thread until it exits.
pub fn start_blocking(config: WatcherConfig) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::Runtime)?;
    runtime.block_on(run(config))
}

/// Poll forever, or until ctrl-c / SIGTERM.
pub async fn run(config: WatcherConfig) -> Result<(), DaemonError> {
    tracing::info!(
        endpoint = %config.endpoint,
        interval_ms = config.interval.as_millis() as u64,
        env = %config.env_path.display(),
        dry_run = config.dry_run,
        "starting bidder config watcher",
    );

    let orchestrator = Orchestrator::from_config(&config);
    tracing::info!(watching = %orchestrator.describe(), "poll target");
    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    let loop_rx = shutdown_tx.subscribe();

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = wait_for_signal() => {
                    let name = signal?;
                    tracing::info!(signal = name, "shutdown requested; stopping after the current cycle");
                    let _ = shutdown.send(());
                    Ok(())
                }
            }
        })
    };

    let result = poll_loop(orchestrator, config.interval, loop_rx).await;
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;

    let cycles = result?;
    tracing::info!(cycles, "watcher stopped");
    Ok(())
}

/// Run one cycle per tick until `shutdown_rx` fires. Returns the number of
/// cycles run.
///
/// The first tick is immediate and later ticks stay on the fixed
/// `start + n * period` grid. A cycle that overruns one or more ticks is
/// followed by a single catch-up tick, never a burst. Shutdown is only
/// observed between cycles. A panicking cycle is logged and counted, and the
/// baseline it held survives.
pub async fn poll_loop(
    mut orchestrator: Orchestrator,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<usize, DaemonError> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycles = 0usize;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let (returned, result) = tokio::task::spawn_blocking(move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| orchestrator.tick()));
                    (orchestrator, result)
                })
                .await
                .map_err(|source| DaemonError::Join { task: "poll_cycle", source })?;
                orchestrator = returned;
                cycles += 1;
                match result {
                    Ok(summary) => tracing::debug!(
                        status = summary.status,
                        duration_ms = summary.duration_ms as u64,
                        "poll cycle finished",
                    ),
                    Err(payload) => tracing::error!(
                        panic = %panic_message(payload.as_ref()),
                        "poll cycle panicked, waiting for next tick",
                    ),
                }
            }
        }
    }

    Ok(cycles)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str, DaemonError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).map_err(DaemonError::Signal)?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.map_err(DaemonError::Signal)?;
            Ok("ctrl-c")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str, DaemonError> {
    tokio::signal::ctrl_c().await.map_err(DaemonError::Signal)?;
    Ok("ctrl-c")
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(source) => Err(DaemonError::Join { task, source }),
    }
}

/// Install the global fmt subscriber on stderr. `RUST_LOG` overrides the
/// `info` default. Safe to call more than once.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

use thiserror::Error;

/// Error surface for the daemon runtime itself.
///
/// Per-cycle failures are [`crate::CycleError`] and never end the loop.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to start tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("{task} task join failure: {source}")]
    Join {
        task: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("signal handler failed: {0}")]
    Signal(#[source] std::io::Error),
}

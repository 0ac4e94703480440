//! bidwatch daemon: parameter source, service reloader, and the polling loop.

mod error;
pub mod orchestrator;
pub mod reload;
mod runtime;
pub mod source;

pub use error::DaemonError;
pub use orchestrator::{CycleError, CycleOutcome, CycleSummary, Orchestrator, ReloadStatus};
pub use reload::{
    DryRunExecutor, ReloadAction, ReloadError, ReloadExecutor, ServiceReloader,
    SystemctlExecutor,
};
pub use runtime::{init_tracing, poll_loop, run, start_blocking};
pub use source::{HttpSource, ParameterSource, SourceError};

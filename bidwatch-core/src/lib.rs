//! bidwatch core library: parameter model, change detection, configuration.
//!
//! - [`types`]: snapshots, baseline, update sets
//! - [`detect`]: [`detect::diff`] and canonical value formatting
//! - [`config`]: [`WatcherConfig`] and startup path/duration resolution
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod detect;
pub mod error;
pub mod types;

pub use config::WatcherConfig;
pub use error::ConfigError;
pub use types::{Baseline, ParamKey, ParamValue, ParameterSnapshot, RemotePayload, UpdateSet};

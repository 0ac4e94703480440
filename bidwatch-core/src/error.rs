//! Error types for bidwatch-core.

use thiserror::Error;

/// Errors raised while resolving watcher configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `dirs::home_dir()` returned `None` while expanding a `~` path.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A duration string such as `30s` could not be parsed.
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },

    /// The poll interval must be positive.
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

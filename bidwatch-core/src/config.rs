//! Watcher configuration resolved once at startup.
//!
//! # API pattern
//!
//! Home-relative helpers come in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/config";
pub const DEFAULT_ENV_PATH: &str = "~/sp1-cluster/infra/.env";
pub const DEFAULT_SERVICE: &str = "bidder";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the polling loop needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// `GET` target returning the parameter JSON.
    pub endpoint: String,
    /// Wait between ticks.
    pub interval: Duration,
    /// Absolute (already `~`-expanded) path to the key=value file.
    pub env_path: PathBuf,
    /// Log reload commands instead of running them.
    pub dry_run: bool,
    /// Upper bound on a single fetch.
    pub fetch_timeout: Duration,
    /// systemd unit restarted after a confirmed write.
    pub service: String,
    /// Prefix reload commands with `sudo`.
    pub use_sudo: bool,
}

impl WatcherConfig {
    /// Build a config from raw CLI values, expanding `~` against the current
    /// user's home directory.
    pub fn from_parts(
        endpoint: impl Into<String>,
        interval: Duration,
        env_path: &str,
        dry_run: bool,
    ) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self {
            endpoint: endpoint.into(),
            interval,
            env_path: expand_home(env_path)?,
            dry_run,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            service: DEFAULT_SERVICE.to_string(),
            use_sudo: true,
        })
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_service(mut self, service: impl Into<String>, use_sudo: bool) -> Self {
        self.service = service.into();
        self.use_sudo = use_sudo;
        self
    }
}

/// Expand a leading `~` or `~/` against `home`. Other paths are returned
/// unchanged (`~user/…` is not supported and passes through as-is).
pub fn expand_home_at(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

/// `expand_home_at` convenience wrapper. Only consults the home directory
/// when `raw` actually starts with `~`.
pub fn expand_home(raw: &str) -> Result<PathBuf, ConfigError> {
    if raw == "~" || raw.starts_with("~/") {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        return Ok(expand_home_at(raw, &home));
    }
    Ok(PathBuf::from(raw))
}

/// Parse durations like `100ms`, `30s`, `5m`, `1h`. A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDuration {
        input: s.to_string(),
        reason,
    };

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty duration string".to_string()));
    }

    let (num_str, unit) = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| trimmed.split_at(i))
        .unwrap_or((trimmed, "s"));

    let num: u64 = num_str
        .parse()
        .map_err(|_| invalid(format!("invalid number '{num_str}'")))?;

    let multiplier: u64 = match unit.to_ascii_lowercase().as_str() {
        "ms" => 1,
        "s" => 1000,
        "m" => 60 * 1000,
        "h" => 60 * 60 * 1000,
        other => return Err(invalid(format!("unknown unit '{other}'"))),
    };

    let millis = num
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("value too large".to_string()))?;
    Ok(Duration::from_millis(millis))
}

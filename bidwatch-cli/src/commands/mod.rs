pub mod diff;
pub mod once;
pub mod run;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use bidwatch_core::config::{
    parse_duration, DEFAULT_ENDPOINT, DEFAULT_ENV_PATH, DEFAULT_SERVICE,
};
use bidwatch_core::WatcherConfig;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Parameter endpoint to poll.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Time between polls (`500ms`, `30s`, `5m`, `1h`).
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub interval: Duration,

    /// Env file to keep in sync. A leading `~` is expanded.
    #[arg(long = "env", default_value = DEFAULT_ENV_PATH)]
    pub env_path: String,

    /// Write the file but only log the systemctl commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Per-request HTTP timeout.
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// systemd unit restarted after a confirmed write.
    #[arg(long, default_value = DEFAULT_SERVICE)]
    pub service: String,

    /// Invoke `systemctl` directly instead of through `sudo`.
    #[arg(long)]
    pub no_sudo: bool,
}

impl WatchArgs {
    pub fn to_config(&self) -> Result<WatcherConfig> {
        let config = WatcherConfig::from_parts(
            self.endpoint.clone(),
            self.interval,
            &self.env_path,
            self.dry_run,
        )
        .context("invalid watcher configuration")?;
        Ok(config
            .with_fetch_timeout(self.timeout)
            .with_service(self.service.clone(), !self.no_sudo))
    }
}

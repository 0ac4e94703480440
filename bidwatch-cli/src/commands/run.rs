//! `bidwatch run`: the long-running poll loop.

use anyhow::{Context, Result};
use clap::Args;

use bidwatch_daemon::start_blocking;

use super::WatchArgs;

/// Arguments for `bidwatch run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub watch: WatchArgs,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = self.watch.to_config()?;
        start_blocking(config).context("watcher exited with error")
    }
}

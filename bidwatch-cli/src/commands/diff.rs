//! `bidwatch diff`: show a unified diff of what a poll would write.

use anyhow::{Context, Result};
use clap::Args;

use bidwatch_daemon::Orchestrator;

use super::WatchArgs;

/// Arguments for `bidwatch diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub watch: WatchArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let config = self.watch.to_config()?;
        let orchestrator = Orchestrator::from_config(&config);

        let diff = orchestrator
            .preview()
            .with_context(|| format!("diff failed for '{}'", config.env_path.display()))?;

        match diff {
            None => println!("No differences for '{}'.", config.env_path.display()),
            Some(unified) => {
                print!("{unified}");
                if !unified.ends_with('\n') {
                    println!();
                }
            }
        }
        Ok(())
    }
}

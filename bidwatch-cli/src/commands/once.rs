//! `bidwatch once`: a single poll cycle, reported on stdout.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use bidwatch_daemon::{CycleSummary, Orchestrator};

use super::WatchArgs;

/// Arguments for `bidwatch once`.
#[derive(Args, Debug)]
pub struct OnceArgs {
    #[command(flatten)]
    pub watch: WatchArgs,

    /// Emit the cycle summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl OnceArgs {
    pub fn run(self) -> Result<()> {
        let config = self.watch.to_config()?;
        let mut orchestrator = Orchestrator::from_config(&config);
        let summary = orchestrator.tick();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary)
                    .context("failed to render cycle summary JSON")?
            );
        } else {
            print_human(&summary);
        }

        if summary.is_failure() {
            bail!(
                "poll cycle failed: {}",
                summary.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}

fn print_human(summary: &CycleSummary) {
    match summary.status {
        "applied" => {
            let action = if summary.written {
                "updated"
            } else {
                "already current"
            };
            println!(
                "{} {} ({})",
                "applied".green().bold(),
                summary.keys.join(", "),
                action
            );
            if let Some(err) = &summary.reload_error {
                println!("{} {err}", "reload failed:".yellow().bold());
            }
        }
        "failed" => {
            println!(
                "{} {}",
                "failed".red().bold(),
                summary.error.as_deref().unwrap_or_default()
            );
        }
        _ => println!("{}", "no changes".dimmed()),
    }
}

//! bidwatch: keep the bidder's `.env` in sync with a remote parameter endpoint.
//!
//! # Usage
//!
//! ```text
//! bidwatch run  [--endpoint URL] [--interval 30s] [--env PATH] [--dry-run]
//! bidwatch once [OPTIONS] [--json]
//! bidwatch diff [OPTIONS]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, once::OnceArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "bidwatch",
    version,
    about = "Poll bidder parameters and apply them to the bidder's env file",
    long_about = None,
)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the endpoint forever, applying changes and restarting the service.
    Run(RunArgs),

    /// Run a single poll cycle and print a summary.
    Once(OnceArgs),

    /// Show a unified diff of what a poll would write. Writes nothing.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    bidwatch_daemon::init_tracing(cli.log_json);
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Once(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}

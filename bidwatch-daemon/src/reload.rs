//! Service reload after a confirmed config write.
//!
//! [`ServiceReloader`] runs two ordered actions, `daemon-reload` then
//! `restart <service>`, through a [`ReloadExecutor`]:
//! - [`SystemctlExecutor`] spawns the commands for real.
//! - [`DryRunExecutor`] only logs them and always succeeds.
//!
//! The executor is chosen once at startup.

use std::process::{Command, ExitStatus};

use thiserror::Error;

/// One external command, e.g. `sudo systemctl daemon-reload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadAction {
    pub program: String,
    pub args: Vec<String>,
}

impl ReloadAction {
    fn systemctl(use_sudo: bool, args: &[&str]) -> Self {
        let mut argv: Vec<String> = Vec::new();
        if use_sudo {
            argv.push("systemctl".to_string());
        }
        argv.extend(args.iter().map(|a| a.to_string()));
        Self {
            program: if use_sudo { "sudo" } else { "systemctl" }.to_string(),
            args: argv,
        }
    }

    /// Reload the service manager's unit definitions.
    pub fn daemon_reload(use_sudo: bool) -> Self {
        Self::systemctl(use_sudo, &["daemon-reload"])
    }

    /// Restart `service`.
    pub fn restart(service: &str, use_sudo: bool) -> Self {
        Self::systemctl(use_sudo, &["restart", service])
    }

    /// Shell-like rendering for logs and errors.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Error)]
pub enum ReloadError {
    /// The command could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("`{command}` failed ({status}): {output}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },
}

/// Runs a single reload action, returning its combined output.
pub trait ReloadExecutor: Send {
    fn execute(&self, action: &ReloadAction) -> Result<String, ReloadError>;
}

/// Executes actions as child processes.
#[derive(Debug, Default)]
pub struct SystemctlExecutor;

impl ReloadExecutor for SystemctlExecutor {
    fn execute(&self, action: &ReloadAction) -> Result<String, ReloadError> {
        let command = action.command_line();
        let output = Command::new(&action.program)
            .args(&action.args)
            .output()
            .map_err(|source| ReloadError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}{stderr}").trim().to_string();
        tracing::info!(command = %command, output = %combined, "ran reload action");

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ReloadError::Failed {
                command,
                status: output.status,
                output: combined,
            })
        }
    }
}

/// Logs actions without running them.
#[derive(Debug, Default)]
pub struct DryRunExecutor;

impl ReloadExecutor for DryRunExecutor {
    fn execute(&self, action: &ReloadAction) -> Result<String, ReloadError> {
        tracing::info!("[dry-run] would run: {}", action.command_line());
        Ok(String::new())
    }
}

/// Issues `daemon-reload` then `restart`, stopping at the first failure.
pub struct ServiceReloader {
    executor: Box<dyn ReloadExecutor>,
    actions: Vec<ReloadAction>,
}

impl ServiceReloader {
    pub fn new(executor: Box<dyn ReloadExecutor>, service: &str, use_sudo: bool) -> Self {
        Self {
            executor,
            actions: vec![
                ReloadAction::daemon_reload(use_sudo),
                ReloadAction::restart(service, use_sudo),
            ],
        }
    }

    /// Pick the executor for `dry_run`.
    pub fn for_mode(dry_run: bool, service: &str, use_sudo: bool) -> Self {
        let executor: Box<dyn ReloadExecutor> = if dry_run {
            Box::new(DryRunExecutor)
        } else {
            Box::new(SystemctlExecutor)
        };
        Self::new(executor, service, use_sudo)
    }

    pub fn actions(&self) -> &[ReloadAction] {
        &self.actions
    }

    pub fn reload_and_restart(&self) -> Result<(), ReloadError> {
        for action in &self.actions {
            self.executor.execute(action)?;
        }
        Ok(())
    }
}

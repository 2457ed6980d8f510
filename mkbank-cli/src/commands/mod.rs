//! CLI command implementations

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod logs;
pub mod transact;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use mkbank_core::services::{Activation, DashboardController, RedirectReason};
use mkbank_core::{BankContext, EntryPoint, LogEvent, LoggingService};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let bank_dir = get_bank_dir().ok()?;
    std::fs::create_dir_all(&bank_dir).ok()?;
    LoggingService::new(&bank_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Record that a command started
pub fn log_command(logger: &Option<LoggingService>, command: &str) {
    if let Some(l) = logger {
        let _ = l.log_command(command);
    }
}

/// Get the data directory from MKBANK_DIR or default to ~/.mkbank
pub fn get_bank_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var("MKBANK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".mkbank"))
}

/// Get or create the bank context
pub fn get_context() -> Result<BankContext> {
    let bank_dir = get_bank_dir()?;

    std::fs::create_dir_all(&bank_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", bank_dir))?;

    BankContext::new(&bank_dir).context("Failed to initialize MK Bank client")
}

/// Password from --password, MKBANK_PASSWORD, or an interactive prompt
pub fn get_password_or_prompt(password_flag: Option<String>) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }
    if let Ok(p) = env::var("MKBANK_PASSWORD") {
        return Ok(p);
    }
    let p = Password::new().with_prompt("Password").interact()?;
    Ok(p)
}

/// Activate the dashboard, showing a spinner on a terminal.
///
/// A redirect to login is logged and turned into an error telling the user
/// to sign in again.
pub fn open_dashboard(
    ctx: &BankContext,
    logger: &Option<LoggingService>,
    command: &str,
) -> Result<DashboardController> {
    let mut dashboard = ctx.dashboard();

    let spinner = if atty::is(atty::Stream::Stderr) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Loading your account...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let activation = dashboard.activate();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match activation? {
        Activation::Ready => {
            log_event(logger, LogEvent::new("dashboard_loaded").with_command(command));
            Ok(dashboard)
        }
        Activation::RedirectToLogin { reason, cause, .. } => {
            let mut event = LogEvent::new("dashboard_redirected").with_command(command);
            if let Some(err) = &cause {
                event = event.with_core_error(err);
            }
            log_event(logger, event);

            match reason {
                RedirectReason::NoSession => bail!("You are not signed in. Run `mkb login` first."),
                RedirectReason::Unauthorized => {
                    bail!("Your session has expired. Run `mkb login` to sign in again.")
                }
                RedirectReason::DeadlineExceeded => bail!(
                    "MK Bank did not respond in time. Run `mkb login` to sign in again."
                ),
                RedirectReason::LoadFailed => {
                    let detail = cause.map(|e| e.to_string()).unwrap_or_default();
                    bail!(
                        "Could not load your account ({}). Run `mkb login` to sign in again.",
                        detail
                    )
                }
            }
        }
    }
}

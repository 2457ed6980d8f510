//! Config command - view and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{get_bank_dir, get_logger, log_command};
use crate::output;
use mkbank_core::config::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Point the client at another backend
    SetBackend {
        /// Base URL, e.g. https://bank.example.com
        url: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let logger = get_logger();
    let bank_dir = get_bank_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            log_command(&logger, "config show");
            let config = Config::load(&bank_dir)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "dataDir": bank_dir.to_string_lossy(),
                        "backendUrl": config.backend_url,
                        "requestTimeoutSecs": config.request_timeout_secs,
                        "dashboardDeadlineSecs": config.dashboard_deadline_secs,
                        "reconcileAfterTransaction": config.reconcile_after_transaction,
                    }))?
                );
                return Ok(());
            }

            println!("{}", "MK Bank Configuration".bold());
            let deadline = match config.dashboard_deadline() {
                Some(d) => format!("{}s", d.as_secs()),
                None => "disabled".to_string(),
            };
            let mut table = output::create_table();
            table.add_row(vec!["Data directory".to_string(), bank_dir.display().to_string()]);
            table.add_row(vec!["Backend URL".to_string(), config.backend_url.clone()]);
            table.add_row(vec![
                "Request timeout".to_string(),
                format!("{}s", config.request_timeout_secs),
            ]);
            table.add_row(vec!["Dashboard deadline".to_string(), deadline]);
            table.add_row(vec![
                "Reconcile after transaction".to_string(),
                config.reconcile_after_transaction.to_string(),
            ]);
            println!("{}", table);
        }
        ConfigCommands::SetBackend { url } => {
            log_command(&logger, "config set-backend");
            std::fs::create_dir_all(&bank_dir)?;
            // Read the file without env overrides so they are not persisted
            let mut config = Config::load_with_env(&bank_dir, |_| None)?;
            config.set_backend_url(&url)?;
            config.save(&bank_dir)?;
            output::success(&format!("Backend set to {}", config.backend_url));
        }
    }

    Ok(())
}

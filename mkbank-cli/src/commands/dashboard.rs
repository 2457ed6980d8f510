//! Dashboard and history commands

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger, log_command, open_dashboard};
use crate::output;

const RECENT_TRANSACTIONS: usize = 5;

pub fn run(json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "dashboard");

    let ctx = get_context()?;
    let dashboard = open_dashboard(&ctx, &logger, "dashboard")?;

    if json {
        let view = serde_json::json!({
            "username": dashboard.display_name(),
            "account_number": dashboard.masked_account_number(),
            "balance": dashboard.formatted_balance(),
            "transactions": dashboard.history(),
            "warnings": dashboard.warnings(),
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{}", format!("Welcome, {}", dashboard.display_name()).bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Account", &dashboard.masked_account_number()]);
    table.add_row(vec!["Balance", &output::rupees(&dashboard.formatted_balance())]);
    println!("{}", table);
    println!();

    for warning in dashboard.warnings() {
        output::warning(warning);
    }

    let history = dashboard.history();
    if history.is_empty() {
        output::info("No transactions yet.");
    } else {
        println!("{}", "Recent Transactions".bold());
        let shown = &history[..history.len().min(RECENT_TRANSACTIONS)];
        println!("{}", output::transactions_table(shown));
        if history.len() > RECENT_TRANSACTIONS {
            println!("  ... {} more, see `mkb history`", history.len() - RECENT_TRANSACTIONS);
        }
    }

    Ok(())
}

pub fn history(json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "history");

    let ctx = get_context()?;
    let dashboard = open_dashboard(&ctx, &logger, "history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(dashboard.history())?);
        return Ok(());
    }

    for warning in dashboard.warnings() {
        output::warning(warning);
    }

    if dashboard.history().is_empty() {
        output::info("No transactions yet.");
    } else {
        println!("{}", output::transactions_table(dashboard.history()));
    }

    Ok(())
}

//! Credit and debit commands

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::{get_context, get_logger, log_command, log_event, open_dashboard};
use crate::output;
use mkbank_core::services::{validate_amount, SubmitError};
use mkbank_core::{LogEvent, LoggingService, OperationResult, Transaction, TransactionType};

pub fn credit(amount: &str, json: bool) -> Result<()> {
    run(TransactionType::Credit, amount, json)
}

pub fn debit(amount: &str, json: bool) -> Result<()> {
    run(TransactionType::Debit, amount, json)
}

fn run(kind: TransactionType, amount: &str, json: bool) -> Result<()> {
    let command = kind.as_str();
    let logger = get_logger();
    log_command(&logger, command);

    let amount = match validate_amount(amount) {
        Ok(amount) => amount,
        Err(failure) => return report_failure(&logger, kind, failure, json),
    };

    let ctx = get_context()?;
    let mut dashboard = open_dashboard(&ctx, &logger, command)?;

    match dashboard.submit_amount(kind, amount) {
        Ok(transaction) => {
            log_event(
                &logger,
                LogEvent::new("transaction_submitted")
                    .with_command(command)
                    .with_transaction_type(kind),
            );

            if json {
                let mut context = HashMap::new();
                context.insert(
                    "balance".to_string(),
                    serde_json::json!(dashboard.formatted_balance()),
                );
                if !dashboard.warnings().is_empty() {
                    context.insert("warnings".to_string(), serde_json::json!(dashboard.warnings()));
                }
                let result: OperationResult<Transaction> =
                    OperationResult::ok_with_context(transaction, context);
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let verb = match kind {
                TransactionType::Credit => "Credited",
                TransactionType::Debit => "Debited",
            };
            output::success(&format!(
                "{} {}",
                verb,
                output::rupees(&mkbank_core::domain::display::format_balance(transaction.amount))
            ));
            println!("  New balance: {}", output::rupees(&dashboard.formatted_balance()));
            for warning in dashboard.warnings() {
                output::warning(warning);
            }
            Ok(())
        }
        Err(failure) => report_failure(&logger, kind, failure, json),
    }
}

fn report_failure(
    logger: &Option<LoggingService>,
    kind: TransactionType,
    failure: SubmitError,
    json: bool,
) -> Result<()> {
    log_event(
        logger,
        LogEvent::new("transaction_failed")
            .with_command(kind.as_str())
            .with_transaction_type(kind)
            .with_core_error(&failure.cause),
    );

    if json {
        let result: OperationResult<Transaction> = OperationResult::fail(&failure.message);
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Err(anyhow!(failure.message))
}

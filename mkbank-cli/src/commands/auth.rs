//! Login, register and logout commands

use anyhow::{anyhow, Result};
use dialoguer::Input;
use rust_decimal::Decimal;

use super::{get_context, get_logger, get_password_or_prompt, log_command, log_event};
use crate::output;
use mkbank_core::services::AuthSuccess;
use mkbank_core::{Credential, LogEvent, RegistrationRequest};

fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

fn print_welcome(success: &AuthSuccess) {
    let account = &success.session.account;
    output::success(&format!("Welcome, {}!", account.display_name()));
    println!("  Account: {}", account.masked_account_number());
    println!("  Balance: {}", output::rupees(&account.formatted_balance()));
}

pub fn login(username: Option<String>, password: Option<String>) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "login");

    let ctx = get_context()?;
    let username = value_or_prompt(username, "Username")?;
    let password = get_password_or_prompt(password)?;

    let mut flow = ctx.auth_flow();
    match flow.login(&Credential::new(username, password)) {
        Ok(success) => {
            log_event(&logger, LogEvent::new("login_succeeded").with_command("login"));
            print_welcome(&success);
            Ok(())
        }
        Err(failure) => {
            log_event(
                &logger,
                LogEvent::new("login_failed")
                    .with_command("login")
                    .with_core_error(&failure.cause),
            );
            Err(anyhow!(failure.message))
        }
    }
}

pub fn register(
    username: Option<String>,
    email: Option<String>,
    account_number: Option<String>,
    balance: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "register");

    let ctx = get_context()?;
    let username = value_or_prompt(username, "Username")?;
    let email = value_or_prompt(email, "Email")?;
    let account_number = value_or_prompt(account_number, "Account number (16 digits)")?;
    let balance = value_or_prompt(balance, "Initial deposit")?;
    let balance: Decimal = balance
        .trim()
        .parse()
        .map_err(|_| anyhow!("Initial deposit must be a number"))?;
    let password = get_password_or_prompt(password)?;

    let request = RegistrationRequest::new(
        Credential::new(username, password),
        email,
        account_number,
        balance,
    );

    let mut flow = ctx.auth_flow();
    match flow.register(&request) {
        Ok(success) => {
            log_event(&logger, LogEvent::new("register_succeeded").with_command("register"));
            print_welcome(&success);
            Ok(())
        }
        Err(failure) => {
            log_event(
                &logger,
                LogEvent::new("register_failed")
                    .with_command("register")
                    .with_core_error(&failure.cause),
            );
            Err(anyhow!(failure.message))
        }
    }
}

pub fn logout() -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "logout");

    let ctx = get_context()?;
    let mut dashboard = ctx.dashboard();
    dashboard.logout()?;

    output::success("Signed out.");
    Ok(())
}

//! MK Bank CLI - your MK Bank account in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{auth, config, dashboard, logs, transact};

/// MK Bank - your account in the terminal
#[derive(Parser)]
#[command(name = "mkb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Password (or set MKBANK_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in to it
    Register {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        /// 16-digit account number
        #[arg(long)]
        account_number: Option<String>,
        /// Initial deposit
        #[arg(long)]
        balance: Option<String>,
        /// Password (or set MKBANK_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Discard the stored session
    Logout,

    /// Show the account overview and recent transactions
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the transaction history
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add money to the account
    Credit {
        /// Amount, e.g. 250.00
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Take money from the account
    Debit {
        /// Amount, e.g. 250.00
        amount: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or change client settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage client logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { username, password } => auth::login(username, password),
        Commands::Register {
            username,
            email,
            account_number,
            balance,
            password,
        } => auth::register(username, email, account_number, balance, password),
        Commands::Logout => auth::logout(),
        Commands::Dashboard { json } => dashboard::run(json),
        Commands::History { json } => dashboard::history(json),
        Commands::Credit { amount, json } => transact::credit(&amount, json),
        Commands::Debit { amount, json } => transact::debit(&amount, json),
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}

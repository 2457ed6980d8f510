//! Dashboard controller - account view and credit/debit submission
//!
//! Activation loads the account snapshot and transaction history in
//! parallel. Submissions apply the confirmed amount to the local balance
//! and prepend the new transaction; the server balance is only re-read
//! when reconciliation is switched on.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::display;
use crate::domain::result::{Error, Result};
use crate::domain::{
    check_amount, parse_amount, AccountSnapshot, Redirect, Transaction, TransactionType,
};
use crate::ports::BankApi;
use crate::services::session::SessionStore;

/// How long activation waits for the account snapshot
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

pub const INVALID_AMOUNT_MESSAGE: &str = "Please enter a valid positive amount.";
pub const INSUFFICIENT_BALANCE_MESSAGE: &str = "Insufficient balance.";
pub const DEBIT_FAILED_MESSAGE: &str = "Debit failed. Please try again.";
pub const CREDIT_FAILED_MESSAGE: &str = "Credit failed. Please try again.";

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// `None` waits for the snapshot indefinitely
    pub deadline: Option<Duration>,
    /// Re-read the server balance after every confirmed submission
    pub reconcile_after_transaction: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            deadline: Some(DEFAULT_DEADLINE),
            reconcile_after_transaction: false,
        }
    }
}

/// Why activation sent the user back to the login screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// No access token stored; nothing was requested
    NoSession,
    /// The backend rejected the token
    Unauthorized,
    /// The snapshot did not arrive before the deadline
    DeadlineExceeded,
    /// Any other snapshot failure (network, unexpected status, bad body)
    LoadFailed,
}

#[derive(Debug)]
pub enum Activation {
    Ready,
    RedirectToLogin {
        reason: RedirectReason,
        cause: Option<Error>,
        /// Whether the stored session was discarded
        session_cleared: bool,
    },
}

impl Activation {
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Activation::Ready => None,
            Activation::RedirectToLogin { .. } => Some(Redirect::Login),
        }
    }
}

/// A rejected or failed submission with the message to show
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SubmitError {
    pub message: String,
    #[source]
    pub cause: Error,
}

fn invalid_amount(cause: Error) -> SubmitError {
    SubmitError {
        message: INVALID_AMOUNT_MESSAGE.to_string(),
        cause,
    }
}

/// Parse amount text the way a submission does, without touching the backend.
pub fn validate_amount(amount: &str) -> std::result::Result<Decimal, SubmitError> {
    parse_amount(amount).map_err(invalid_amount)
}

fn submit_failure_message(kind: TransactionType, error: &Error) -> &'static str {
    match (kind, error) {
        (TransactionType::Debit, Error::InsufficientBalance(_)) => INSUFFICIENT_BALANCE_MESSAGE,
        (TransactionType::Debit, _) => DEBIT_FAILED_MESSAGE,
        (TransactionType::Credit, _) => CREDIT_FAILED_MESSAGE,
    }
}

/// Run `job` on a detached worker thread. A result arriving after the
/// receiver is gone is dropped.
fn spawn_fetch<T, F>(job: F) -> Receiver<Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(job());
    });
    rx
}

fn wait_for<T>(rx: &Receiver<Result<T>>, wait: Option<Duration>, deadline: Duration) -> Result<T> {
    let received = match wait {
        Some(timeout) => rx.recv_timeout(timeout),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };
    match received {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(Error::DeadlineExceeded(deadline)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(Error::network("Request worker stopped without a response"))
        }
    }
}

pub struct DashboardController {
    api: Arc<dyn BankApi>,
    store: Arc<SessionStore>,
    options: DashboardOptions,
    account: Option<AccountSnapshot>,
    history: Vec<Transaction>,
    warnings: Vec<String>,
}

impl DashboardController {
    pub fn new(api: Arc<dyn BankApi>, store: Arc<SessionStore>, options: DashboardOptions) -> Self {
        Self {
            api,
            store,
            options,
            account: None,
            history: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Load the account snapshot and history for the stored session.
    ///
    /// Only storage failures are returned as errors; every backend problem
    /// becomes a redirect.
    pub fn activate(&mut self) -> Result<Activation> {
        self.account = None;
        self.history.clear();
        self.warnings.clear();

        let Some(token) = self.store.read()? else {
            return Ok(Activation::RedirectToLogin {
                reason: RedirectReason::NoSession,
                cause: None,
                session_cleared: false,
            });
        };

        let started = Instant::now();
        let snapshot_rx = {
            let api = Arc::clone(&self.api);
            let token = token.clone();
            spawn_fetch(move || api.fetch_dashboard(&token))
        };
        let history_rx = {
            let api = Arc::clone(&self.api);
            let token = token.clone();
            spawn_fetch(move || api.fetch_transactions(&token))
        };

        let deadline = self.options.deadline;
        let limit = deadline.unwrap_or(DEFAULT_DEADLINE);

        let mut snapshot = match wait_for(&snapshot_rx, deadline, limit) {
            Ok(snapshot) => snapshot,
            Err(error) => return self.redirect_after(error),
        };

        let remaining = deadline.map(|d| d.saturating_sub(started.elapsed()));
        match wait_for(&history_rx, remaining, limit) {
            Ok(history) => self.history = history,
            Err(error) => self
                .warnings
                .push(format!("Transaction history unavailable: {}", error)),
        }

        if snapshot.id.is_none() {
            snapshot.id = self
                .store
                .load()
                .ok()
                .flatten()
                .and_then(|session| session.account.id);
        }
        if let Err(error) = self.store.update_account(&snapshot) {
            self.warnings
                .push(format!("Could not update the saved session: {}", error));
        }
        self.account = Some(snapshot);

        Ok(Activation::Ready)
    }

    fn redirect_after(&mut self, error: Error) -> Result<Activation> {
        let reason = match error {
            Error::Unauthorized => RedirectReason::Unauthorized,
            Error::DeadlineExceeded(_) => RedirectReason::DeadlineExceeded,
            _ => RedirectReason::LoadFailed,
        };
        let session_cleared = matches!(
            reason,
            RedirectReason::Unauthorized | RedirectReason::DeadlineExceeded
        );
        if session_cleared {
            self.store.clear()?;
        }
        Ok(Activation::RedirectToLogin {
            reason,
            cause: Some(error),
            session_cleared,
        })
    }

    pub fn account(&self) -> Option<&AccountSnapshot> {
        self.account.as_ref()
    }

    /// Most recent first
    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    /// Non-fatal problems from the last activation or submission
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn balance(&self) -> Decimal {
        self.account.as_ref().map(|a| a.balance).unwrap_or(Decimal::ZERO)
    }

    pub fn masked_account_number(&self) -> String {
        display::mask_account_number(self.account.as_ref().map(|a| a.account_number.as_str()))
    }

    pub fn formatted_balance(&self) -> String {
        display::format_balance(self.balance())
    }

    pub fn display_name(&self) -> &str {
        self.account
            .as_ref()
            .map(|a| a.display_name())
            .unwrap_or("User")
    }

    pub fn submit_credit(&mut self, amount: &str) -> std::result::Result<Transaction, SubmitError> {
        self.submit(TransactionType::Credit, amount)
    }

    pub fn submit_debit(&mut self, amount: &str) -> std::result::Result<Transaction, SubmitError> {
        self.submit(TransactionType::Debit, amount)
    }

    /// Validate `amount`, send it, and apply the confirmed change locally.
    ///
    /// Nothing is mutated unless the backend confirms the transaction.
    pub fn submit(
        &mut self,
        kind: TransactionType,
        amount: &str,
    ) -> std::result::Result<Transaction, SubmitError> {
        let amount = validate_amount(amount)?;
        self.submit_amount(kind, amount)
    }

    /// Submit an already parsed amount. It is checked again before sending.
    pub fn submit_amount(
        &mut self,
        kind: TransactionType,
        amount: Decimal,
    ) -> std::result::Result<Transaction, SubmitError> {
        let amount = check_amount(amount).map_err(invalid_amount)?;

        let fail = |cause: Error| SubmitError {
            message: submit_failure_message(kind, &cause).to_string(),
            cause,
        };

        let token = match self.store.read() {
            Ok(Some(token)) => token,
            Ok(None) => return Err(fail(Error::Unauthorized)),
            Err(error) => return Err(fail(error)),
        };

        let transaction = self
            .api
            .submit_transaction(&token, kind, amount)
            .map_err(fail)?;

        self.warnings.clear();
        if let Some(account) = self.account.as_mut() {
            match account.balance.checked_add(kind.signed(amount)) {
                Some(balance) => account.balance = balance,
                None => self.warnings.push(
                    "Balance is too large to update locally; showing the last known value."
                        .to_string(),
                ),
            }
        }
        self.history.insert(0, transaction.clone());

        if self.options.reconcile_after_transaction {
            self.reconcile(&token);
        }
        if let Some(account) = &self.account {
            if let Err(error) = self.store.update_account(account) {
                self.warnings
                    .push(format!("Could not update the saved session: {}", error));
            }
        }

        Ok(transaction)
    }

    /// Replace the local balance with the server's; keep it on failure
    fn reconcile(&mut self, token: &str) {
        match self.api.fetch_dashboard(token) {
            Ok(mut snapshot) => {
                if let Some(current) = &self.account {
                    snapshot.id = snapshot.id.or_else(|| current.id.clone());
                }
                self.account = Some(snapshot);
            }
            Err(error) => self
                .warnings
                .push(format!("Balance could not be refreshed: {}", error)),
        }
    }

    /// Discard the stored session and in-memory state
    pub fn logout(&mut self) -> Result<Redirect> {
        self.store.clear()?;
        self.account = None;
        self.history.clear();
        self.warnings.clear();
        Ok(Redirect::Login)
    }
}

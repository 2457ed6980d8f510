//! Login and registration input

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::result::{Error, Result};
use super::transaction::is_wire_exact;

/// Username/password pair entered on the login form
///
/// Transient: never written to the session store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration form: a credential plus the new account's details
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub credential: Credential,
    pub email: String,
    /// Exactly 16 ASCII digits
    pub account_number: String,
    /// Initial deposit
    pub balance: Decimal,
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn account_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{16}$").expect("valid account number regex"))
}

impl RegistrationRequest {
    pub fn new(
        credential: Credential,
        email: impl Into<String>,
        account_number: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        Self {
            credential,
            email: email.into(),
            account_number: account_number.into(),
            balance,
        }
    }

    /// Check the form constraints before anything is sent
    pub fn validate(&self) -> Result<()> {
        if self.credential.username.trim().is_empty() {
            return Err(Error::validation("Username is required"));
        }
        if self.email.trim().is_empty() {
            return Err(Error::validation("Email is required"));
        }
        if !email_regex().is_match(self.email.trim()) {
            return Err(Error::validation("Enter a valid email address"));
        }
        if !account_number_regex().is_match(&self.account_number) {
            return Err(Error::validation("Account number must be exactly 16 digits"));
        }
        if self.balance.is_sign_negative() && !self.balance.is_zero() {
            return Err(Error::validation("Initial deposit cannot be negative"));
        }
        if !is_wire_exact(self.balance) {
            return Err(Error::validation("Initial deposit has too many digits"));
        }
        if self.credential.password.is_empty() {
            return Err(Error::validation("Password is required"));
        }
        Ok(())
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("credential", &self.credential)
            .field("email", &self.email)
            .field("account_number", &self.account_number)
            .field("balance", &self.balance)
            .finish()
    }
}

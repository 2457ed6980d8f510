//! Account snapshot, token pair and the session that binds them

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::display;

/// Bearer tokens issued by the backend
///
/// The refresh token is kept alongside the access token but nothing
/// exchanges it; an expired access token means logging in again.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Client-side copy of the server-held account fields
///
/// Stale as soon as a transaction happens anywhere; only a dashboard fetch
/// brings it back in line with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Not returned by the dashboard endpoint, only by login/register
    pub id: Option<String>,
    pub username: String,
    pub account_number: String,
    pub balance: Decimal,
}

impl AccountSnapshot {
    pub fn new(
        id: Option<String>,
        username: impl Into<String>,
        account_number: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            account_number: account_number.into(),
            balance,
        }
    }

    /// Account number with all but the last six digits hidden
    pub fn masked_account_number(&self) -> String {
        display::mask_account_number(Some(&self.account_number))
    }

    /// Balance with exactly two decimal places
    pub fn formatted_balance(&self) -> String {
        display::format_balance(self.balance)
    }

    /// Username, or a generic label when the backend sent none
    pub fn display_name(&self) -> &str {
        if self.username.trim().is_empty() {
            "User"
        } else {
            &self.username
        }
    }
}

/// An authenticated session: created at login, read by every component that
/// calls the API, destroyed at logout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub tokens: TokenPair,
    pub account: AccountSnapshot,
}

impl Session {
    pub fn new(tokens: TokenPair, account: AccountSnapshot) -> Self {
        Self { tokens, account }
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access
    }
}

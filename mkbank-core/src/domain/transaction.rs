//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Direction of a transaction relative to the account balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }

    /// Signed balance delta for a confirmed transaction of `amount`
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionType::Credit => amount,
            TransactionType::Debit => -amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(Error::validation(format!("Unknown transaction type: {}", other))),
        }
    }
}

/// A confirmed transaction as reported by the backend
///
/// Immutable once created. Histories are kept most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        kind: TransactionType,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            amount,
            timestamp,
        }
    }

    /// Balance delta this transaction applied
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// True when `amount` survives the backend's JSON number encoding unchanged.
///
/// Amounts travel as f64, so anything past ~15 significant digits would
/// reach the server rounded.
pub fn is_wire_exact(amount: Decimal) -> bool {
    amount
        .to_f64()
        .filter(|value| value.is_finite())
        .and_then(|value| Decimal::from_str(&value.to_string()).ok())
        .is_some_and(|decoded| decoded == amount)
}

/// Parse user-entered amount text.
///
/// Accepts any decimal strictly greater than zero that the backend can
/// receive exactly; everything else is a validation error.
pub fn parse_amount(input: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(input.trim())
        .map_err(|_| Error::validation("Please enter a valid positive amount."))?;
    check_amount(amount)
}

/// Reject zero, negative and wire-inexact amounts
pub fn check_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO || !is_wire_exact(amount) {
        return Err(Error::validation("Please enter a valid positive amount."));
    }
    Ok(amount)
}

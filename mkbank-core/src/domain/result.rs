//! Result and error types for the core library

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// The first six variants are the taxonomy surfaced to users by the auth
/// and dashboard flows. The rest cover local failures and backend replies
/// that fall outside the per-endpoint contract.
#[derive(Error, Debug)]
pub enum Error {
    /// No response reached the client (connect failure, request timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Missing, expired or rejected access token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The caller stopped waiting; the request may still complete
    #[error("No response within {} seconds", .0.as_secs())]
    DeadlineExceeded(Duration),

    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable, lowercase name of the variant (used in event logs)
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network",
            Error::Unauthorized => "unauthorized",
            Error::InvalidCredentials(_) => "invalid_credentials",
            Error::Validation(_) => "validation",
            Error::InsufficientBalance(_) => "insufficient_balance",
            Error::TransactionFailed(_) => "transaction_failed",
            Error::DeadlineExceeded(_) => "deadline_exceeded",
            Error::Api { .. } => "api",
            Error::InvalidResponse(_) => "invalid_response",
            Error::Config(_) => "config",
            Error::Storage(_) => "storage",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for `--json` output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a successful result with context
    pub fn ok_with_context(data: T, context: HashMap<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: Some(context),
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }
}

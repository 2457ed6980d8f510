//! Backend API port
//!
//! The auth and dashboard flows talk to the bank only through this trait,
//! so tests can swap the HTTP client for an in-memory fake.

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{AccountSnapshot, Credential, RegistrationRequest, Session, Transaction, TransactionType};

/// Operations the MK Bank backend exposes to the client
///
/// No implementation retries. Errors follow the taxonomy in
/// [`crate::domain::result::Error`].
pub trait BankApi: Send + Sync {
    /// Exchange a credential for a token pair and account snapshot.
    ///
    /// Fails with `InvalidCredentials` on a 4xx reply or `Network` when no
    /// response arrives.
    fn login(&self, credential: &Credential) -> Result<Session>;

    /// Create an account and sign in to it.
    ///
    /// Fails with `Validation` when the backend rejects a field.
    fn register(&self, request: &RegistrationRequest) -> Result<Session>;

    /// Current account fields. Fails with `Unauthorized` on 401/403.
    fn fetch_dashboard(&self, access_token: &str) -> Result<AccountSnapshot>;

    /// Transaction history in the order the backend returns it
    fn fetch_transactions(&self, access_token: &str) -> Result<Vec<Transaction>>;

    /// Create a credit or debit.
    ///
    /// Fails with `InsufficientBalance` when the backend reports one,
    /// otherwise `TransactionFailed`.
    fn submit_transaction(
        &self,
        access_token: &str,
        kind: TransactionType,
        amount: Decimal,
    ) -> Result<Transaction>;
}

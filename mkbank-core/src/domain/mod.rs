//! Core domain entities
//!
//! Plain data with validation and display logic - no I/O.

mod account;
mod credential;
pub mod display;
mod navigation;
pub mod result;
mod transaction;

pub use account::{AccountSnapshot, Session, TokenPair};
pub use credential::{Credential, RegistrationRequest};
pub use navigation::Redirect;
pub use transaction::{check_amount, parse_amount, Transaction, TransactionType};

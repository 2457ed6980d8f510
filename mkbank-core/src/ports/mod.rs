//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on concrete implementations.

mod bank_api;
mod session_storage;

pub use bank_api::BankApi;
pub use session_storage::SessionStorage;

//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the BankApi port
//! - JSON file (with file locking) and in-memory maps for SessionStorage
//! - Mock backend server for testing the HTTP client

pub mod file_storage;
pub mod http;
pub mod memory_storage;

#[cfg(test)]
pub mod mock_server;

//! Durable key/value storage port for session data

use crate::domain::result::Result;

/// String key/value medium that survives process restarts
///
/// Mirrors browser local storage: flat string keys and values, whole-store
/// last-writer-wins semantics, no expiry.
pub trait SessionStorage: Send + Sync {
    /// Read a single value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write several values in one update
    fn set_many(&self, entries: &[(&str, String)]) -> Result<()>;

    /// Remove the given keys; missing keys are ignored
    fn remove_many(&self, keys: &[&str]) -> Result<()>;
}

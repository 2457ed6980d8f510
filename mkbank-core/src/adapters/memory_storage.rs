//! In-memory session storage
//!
//! Used by tests and for throwaway sessions that must not touch disk.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::ports::SessionStorage;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        for (key, value) in entries {
            values.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

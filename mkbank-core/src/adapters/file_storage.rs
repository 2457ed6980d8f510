//! JSON file session storage
//!
//! Keeps session keys in `session.json` inside the data directory. Every
//! read and write holds a lock on a sidecar `session.json.lock` file so two
//! `mkb` processes never interleave a read-modify-write; the later writer
//! still wins.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::{Error, Result};
use crate::ports::SessionStorage;

const SESSION_FILE: &str = "session.json";
const LOCK_FILE: &str = "session.json.lock";

/// Session storage backed by a JSON object of string values
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStorage {
    /// Storage rooted in the given data directory
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
            lock_path: data_dir.join(LOCK_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        Ok(file)
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::storage(format!("Corrupt session file {}: {}", self.path.display(), e))
        })
    }

    /// Replace the session file atomically (write temp file, then rename)
    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(map)?;

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // Tokens are bearer credentials
            options.mode(0o600);
        }
        let mut file = options.open(&tmp_path)?;
        std::io::Write::write_all(&mut file, content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn with_lock<T>(&self, exclusive: bool, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.open_lock()?;
        if exclusive {
            FileExt::lock_exclusive(&lock)?;
        } else {
            FileExt::lock_shared(&lock)?;
        }
        let result = f();
        // Unlock errors are irrelevant once the closure ran; dropping the handle releases it too
        let _ = FileExt::unlock(&lock);
        result
    }
}

impl SessionStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_lock(false, || Ok(self.read_map()?.get(key).cloned()))
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        self.with_lock(true, || {
            let mut map = self.read_map()?;
            for (key, value) in entries {
                map.insert((*key).to_string(), value.clone());
            }
            self.write_map(&map)
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.with_lock(true, || {
            let mut map = self.read_map()?;
            for key in keys {
                map.remove(*key);
            }
            self.write_map(&map)
        })
    }
}

//! Configuration management
//!
//! `settings.json` in the data directory:
//! ```json
//! {
//!   "backendUrl": "http://127.0.0.1:8000",
//!   "requestTimeoutSecs": 29,
//!   "dashboardDeadlineSecs": 30,
//!   "reconcileAfterTransaction": false
//! }
//! ```
//! Fields this crate does not know about are kept when saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::services::DashboardOptions;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 29;
pub const DEFAULT_DASHBOARD_DEADLINE_SECS: u64 = 30;

pub const BACKEND_URL_ENV: &str = "MKBANK_BACKEND_URL";
pub const RECONCILE_ENV: &str = "MKBANK_RECONCILE";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dashboard_deadline_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reconcile_after_transaction: Option<bool>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Client configuration with defaults and environment overrides applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    /// 0 disables the dashboard deadline
    pub dashboard_deadline_secs: u64,
    pub reconcile_after_transaction: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            dashboard_deadline_secs: DEFAULT_DASHBOARD_DEADLINE_SECS,
            reconcile_after_transaction: false,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

/// Accept only absolute http(s) URLs
pub fn validate_backend_url(value: &str) -> Result<()> {
    let parsed = url::Url::parse(value.trim())
        .map_err(|e| anyhow::anyhow!("Invalid backend URL '{}': {}", value, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Backend URL must use http or https, got '{}'", parsed.scheme());
    }
    Ok(())
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let settings_path = data_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    serde_json::from_str(&content).with_context(|| {
        format!(
            "{} is not valid settings JSON; fix or remove it",
            settings_path.display()
        )
    })
}

impl Config {
    /// Load config from the data directory, applying `MKBANK_BACKEND_URL`
    /// and `MKBANK_RECONCILE` overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup
    pub fn load_with_env(data_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = read_settings(data_dir)?;
        let defaults = Config::default();

        let backend_url = env(BACKEND_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or(raw.backend_url)
            .unwrap_or(defaults.backend_url);
        validate_backend_url(&backend_url)?;

        let reconcile_after_transaction = env(RECONCILE_ENV)
            .as_deref()
            .and_then(parse_bool)
            .or(raw.reconcile_after_transaction)
            .unwrap_or(defaults.reconcile_after_transaction);

        Ok(Self {
            backend_url: backend_url.trim().trim_end_matches('/').to_string(),
            request_timeout_secs: raw
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout_secs),
            dashboard_deadline_secs: raw
                .dashboard_deadline_secs
                .unwrap_or(defaults.dashboard_deadline_secs),
            reconcile_after_transaction,
        })
    }

    /// Save config to the data directory, preserving fields we don't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let settings_path = data_dir.join("settings.json");

        let mut settings = read_settings(data_dir)?;
        settings.backend_url = Some(self.backend_url.clone());
        settings.request_timeout_secs = Some(self.request_timeout_secs);
        settings.dashboard_deadline_secs = Some(self.dashboard_deadline_secs);
        settings.reconcile_after_transaction = Some(self.reconcile_after_transaction);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Change the backend URL after validating it
    pub fn set_backend_url(&mut self, url: &str) -> Result<()> {
        validate_backend_url(url)?;
        self.backend_url = url.trim().trim_end_matches('/').to_string();
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `None` when the deadline is disabled
    pub fn dashboard_deadline(&self) -> Option<Duration> {
        (self.dashboard_deadline_secs > 0).then(|| Duration::from_secs(self.dashboard_deadline_secs))
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            deadline: self.dashboard_deadline(),
            reconcile_after_transaction: self.reconcile_after_transaction,
        }
    }
}

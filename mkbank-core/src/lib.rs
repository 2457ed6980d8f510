//! MK Bank Core - client logic for the MK Bank backend
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: Core entities (Session, AccountSnapshot, Transaction, etc.)
//! - **ports**: Trait definitions for external dependencies (BankApi, SessionStorage)
//! - **services**: Flow orchestration (auth, dashboard, session store, logging)
//! - **adapters**: Concrete implementations (reqwest HTTP client, JSON file storage)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::file_storage::JsonFileStorage;
use adapters::http::HttpBankApi;
use config::Config;
use ports::{BankApi, SessionStorage};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    AccountSnapshot, Credential, Redirect, RegistrationRequest, Session, TokenPair, Transaction,
    TransactionType,
};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Main context for MK Bank operations
///
/// Holds the configuration, the backend client and the session store, and
/// builds the flows on top of them.
pub struct BankContext {
    pub config: Config,
    pub api: Arc<dyn BankApi>,
    pub session_store: Arc<SessionStore>,
}

impl BankContext {
    /// Context for the data directory: settings.json config, HTTP backend
    /// and session.json storage
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let api = HttpBankApi::with_timeout(&config.backend_url, config.request_timeout())?;
        let storage = JsonFileStorage::new(data_dir);
        Ok(Self::with_parts(config, Arc::new(api), Arc::new(storage)))
    }

    /// Assemble a context from explicit parts
    pub fn with_parts(
        config: Config,
        api: Arc<dyn BankApi>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        Self {
            config,
            api,
            session_store: Arc::new(SessionStore::new(storage)),
        }
    }

    pub fn auth_flow(&self) -> AuthFlow {
        AuthFlow::new(Arc::clone(&self.api), Arc::clone(&self.session_store))
    }

    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(
            Arc::clone(&self.api),
            Arc::clone(&self.session_store),
            self.config.dashboard_options(),
        )
    }
}

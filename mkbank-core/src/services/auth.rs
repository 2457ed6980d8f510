//! Auth flow - login and registration
//!
//! Submits credentials to the backend, stores the resulting session and
//! hands back the dashboard redirect. Failures are turned into the message
//! shown to the user; the underlying error stays available for logging.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::result::Error;
use crate::domain::{Credential, Redirect, RegistrationRequest, Session};
use crate::ports::BankApi;
use crate::services::session::SessionStore;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";
pub const NETWORK_MESSAGE: &str = "Unable to reach MK Bank. Check your connection and try again.";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    Submitting,
    Success,
    /// Carries the user-visible message. A new submission is accepted.
    Failed(String),
}

/// A completed login or registration
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub session: Session,
    pub redirect: Redirect,
}

/// A failed submission with the message to show
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthFailure {
    pub message: String,
    #[source]
    pub cause: Error,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Login,
    Register,
}

impl Operation {
    fn fallback_message(self) -> &'static str {
        match self {
            Operation::Login => LOGIN_FAILED_MESSAGE,
            Operation::Register => REGISTRATION_FAILED_MESSAGE,
        }
    }
}

/// Map an error to the message shown by the login/register forms
fn failure_message(error: &Error, operation: Operation) -> String {
    match error {
        Error::InvalidCredentials(_) => INVALID_CREDENTIALS_MESSAGE.to_string(),
        Error::Validation(msg) => msg.clone(),
        Error::Network(_) => NETWORK_MESSAGE.to_string(),
        _ => operation.fallback_message().to_string(),
    }
}

pub struct AuthFlow {
    api: Arc<dyn BankApi>,
    store: Arc<SessionStore>,
    state: AuthState,
}

impl AuthFlow {
    pub fn new(api: Arc<dyn BankApi>, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            state: AuthState::Idle,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Back to Idle, dropping any failure message
    pub fn reset(&mut self) {
        self.state = AuthState::Idle;
    }

    pub fn login(&mut self, credential: &Credential) -> Result<AuthSuccess, AuthFailure> {
        self.state = AuthState::Submitting;
        let result = self.api.login(credential);
        self.complete(result, Operation::Login)
    }

    /// Register and sign in. Client-side validation runs first; a rejected
    /// form never reaches the backend.
    pub fn register(&mut self, request: &RegistrationRequest) -> Result<AuthSuccess, AuthFailure> {
        self.state = AuthState::Submitting;
        let result = request
            .validate()
            .and_then(|()| self.api.register(request));
        self.complete(result, Operation::Register)
    }

    fn complete(
        &mut self,
        result: crate::domain::result::Result<Session>,
        operation: Operation,
    ) -> Result<AuthSuccess, AuthFailure> {
        let stored = result.and_then(|session| {
            self.store.save_session(&session)?;
            Ok(session)
        });

        match stored {
            Ok(session) => {
                self.state = AuthState::Success;
                Ok(AuthSuccess {
                    session,
                    redirect: Redirect::Dashboard,
                })
            }
            Err(cause) => {
                let message = failure_message(&cause, operation);
                self.state = AuthState::Failed(message.clone());
                Err(AuthFailure { message, cause })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::HttpBankApi;
    use crate::adapters::memory_storage::MemoryStorage;
    use crate::adapters::mock_server::{MockBankServer, MockConfig};
    use rust_decimal::Decimal;

    fn flow(server: &MockBankServer) -> (AuthFlow, Arc<SessionStore>) {
        let api = Arc::new(HttpBankApi::new(&server.base_url()).unwrap());
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        (AuthFlow::new(api, store.clone()), store)
    }

    #[test]
    fn test_failure_messages() {
        let login = Operation::Login;
        assert_eq!(
            failure_message(&Error::InvalidCredentials("x".into()), login),
            INVALID_CREDENTIALS_MESSAGE
        );
        assert_eq!(
            failure_message(&Error::validation("Email is required"), Operation::Register),
            "Email is required"
        );
        assert_eq!(failure_message(&Error::network("refused"), login), NETWORK_MESSAGE);
        assert_eq!(
            failure_message(&Error::Api { status: 500, message: "boom".into() }, login),
            LOGIN_FAILED_MESSAGE
        );
        assert_eq!(
            failure_message(&Error::InvalidResponse("bad".into()), Operation::Register),
            REGISTRATION_FAILED_MESSAGE
        );
    }

    #[test]
    fn test_login_success_populates_store() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        server.add_user("alice", "pw", "1234567890123456", Decimal::new(50000, 2));
        let (mut flow, store) = flow(&server);

        let success = flow.login(&Credential::new("alice", "pw")).unwrap();

        assert_eq!(success.redirect, Redirect::Dashboard);
        assert_eq!(flow.state(), &AuthState::Success);
        assert_eq!(
            store.read().unwrap().as_deref(),
            Some(success.session.access_token())
        );
        assert_eq!(success.session.account.masked_account_number(), "XXXXXXXXXX123456");
    }

    #[test]
    fn test_login_wrong_password_fails_and_recovers() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        server.add_user("alice", "pw", "1234567890123456", Decimal::ZERO);
        let (mut flow, store) = flow(&server);

        let failure = flow.login(&Credential::new("alice", "nope")).unwrap_err();
        assert_eq!(failure.message, INVALID_CREDENTIALS_MESSAGE);
        assert!(matches!(failure.cause, Error::InvalidCredentials(_)));
        assert_eq!(flow.state(), &AuthState::Failed(INVALID_CREDENTIALS_MESSAGE.to_string()));
        assert_eq!(store.read().unwrap(), None);

        // Failed accepts a new submission
        flow.login(&Credential::new("alice", "pw")).unwrap();
        assert_eq!(flow.state(), &AuthState::Success);

        flow.reset();
        assert_eq!(flow.state(), &AuthState::Idle);
    }

    #[test]
    fn test_register_invalid_form_skips_network() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let (mut flow, _) = flow(&server);

        let request = RegistrationRequest::new(
            Credential::new("bob", "pw"),
            "bob@example.com",
            "12345",
            Decimal::ZERO,
        );
        let failure = flow.register(&request).unwrap_err();

        assert_eq!(failure.message, "Account number must be exactly 16 digits");
        assert_eq!(server.request_count(), 0);
    }

    #[test]
    fn test_register_success_and_duplicate() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let (mut flow, store) = flow(&server);

        let request = RegistrationRequest::new(
            Credential::new("bob", "pw"),
            "bob@example.com",
            "6543210987654321",
            Decimal::new(10000, 2),
        );
        let success = flow.register(&request).unwrap();
        assert_eq!(success.session.account.username, "bob");
        assert!(store.read().unwrap().is_some());

        let failure = flow.register(&request).unwrap_err();
        assert!(matches!(failure.cause, Error::Validation(_)));
        assert!(failure.message.starts_with("username"));
    }

    #[test]
    fn test_unreachable_backend() {
        // Nothing listens on port 9 on the loopback interface
        let api = Arc::new(HttpBankApi::new("http://127.0.0.1:9").unwrap());
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        let mut flow = AuthFlow::new(api, store);

        let failure = flow.login(&Credential::new("alice", "pw")).unwrap_err();
        assert_eq!(failure.message, NETWORK_MESSAGE);
    }
}

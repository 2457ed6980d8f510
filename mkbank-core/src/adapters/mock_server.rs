//! Mock MK Bank backend for testing
//!
//! Serves the same endpoints and response shapes as the real backend from
//! in-memory state:
//! - POST /api/login/ and /api/register/ return { token: {...}, user: {...} }
//! - GET /api/dashboard/ returns { username, account_number, balance }
//! - GET /api/transactions/user/ returns [ { id, type, amount, timestamp } ]
//! - POST /api/transaction/ returns the created transaction or { error }

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};

/// Behaviour switches for the mock backend
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Reject every bearer token
    pub fail_auth: bool,
    /// Send `code: insufficient_balance` alongside the error message
    pub structured_errors: bool,
    /// Serialize balances and amounts as strings
    pub decimal_strings: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

#[derive(Debug, Clone)]
struct MockUser {
    id: i64,
    password: String,
    email: String,
    account_number: String,
    balance: Decimal,
    transactions: Vec<JsonValue>,
}

#[derive(Debug, Default)]
struct MockState {
    users: HashMap<String, MockUser>,
    tokens: HashMap<String, String>,
    next_id: i64,
}

/// Mock backend bound to a random loopback port
pub struct MockBankServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    state: Arc<Mutex<MockState>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockBankServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(AtomicUsize::new(0));
        let state = Arc::new(Mutex::new(MockState {
            next_id: 1,
            ..Default::default()
        }));

        // Non-blocking so stop() can end the accept loop
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let state_clone = state.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        requests_clone.fetch_add(1, Ordering::SeqCst);
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Number of connections accepted so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Seed a user directly, bypassing /api/register/
    pub fn add_user(&self, username: &str, password: &str, account_number: &str, balance: Decimal) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.users.insert(
            username.to_string(),
            MockUser {
                id,
                password: password.to_string(),
                email: format!("{}@example.com", username),
                account_number: account_number.to_string(),
                balance,
                transactions: Vec::new(),
            },
        );
    }

    /// Server-side balance for a user
    pub fn balance_of(&self, username: &str) -> Option<Decimal> {
        self.state.lock().unwrap().users.get(username).map(|u| u.balance)
    }

    /// Change a balance behind the client's back
    pub fn set_balance(&self, username: &str, balance: Decimal) {
        if let Some(user) = self.state.lock().unwrap().users.get_mut(username) {
            user.balance = balance;
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockBankServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one request: head plus a Content-Length body
fn read_request(stream: &mut TcpStream) -> Option<(String, String, HashMap<String, String>, String)> {
    stream.set_nonblocking(false).ok()?;
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.lines();
    let first_line = lines.next()?;
    let mut parts = first_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let body = String::from_utf8_lossy(&data[header_end..]).to_string();
    Some((method, path, headers, body))
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, state: &Mutex<MockState>) {
    let Some((method, path, headers, body)) = read_request(&mut stream) else {
        return;
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let bearer = headers
        .get("authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from);
    let payload: JsonValue = serde_json::from_str(&body).unwrap_or(JsonValue::Null);
    let path = path.split('?').next().unwrap_or("").to_string();

    let (status, response) = {
        let mut state = state.lock().unwrap();
        route(&method, &path, bearer.as_deref(), &payload, config, &mut state)
    };
    send_response(&mut stream, status, &response.to_string());
}

fn money(value: Decimal, config: &MockConfig) -> JsonValue {
    if config.decimal_strings {
        json!(crate::domain::display::format_balance(value))
    } else {
        json!(value.to_string().parse::<f64>().unwrap_or_default())
    }
}

fn auth_body(token: &str, username: &str, user: &MockUser, config: &MockConfig) -> JsonValue {
    json!({
        "token": {"access": token, "refresh": format!("refresh-{}", token)},
        "user": {
            "id": user.id,
            "username": username,
            "account_number": user.account_number,
            "balance": money(user.balance, config),
        }
    })
}

fn route(
    method: &str,
    path: &str,
    bearer: Option<&str>,
    payload: &JsonValue,
    config: &MockConfig,
    state: &mut MockState,
) -> (u16, JsonValue) {
    match (method, path) {
        ("POST", "/api/login/") => {
            let username = payload["username"].as_str().unwrap_or_default();
            let password = payload["password"].as_str().unwrap_or_default();
            let Some(user) = state.users.get(username).cloned() else {
                return (401, json!({"detail": "No active account found with the given credentials"}));
            };
            if user.password != password {
                return (401, json!({"detail": "No active account found with the given credentials"}));
            }
            let token = format!("token-{}-{}", username, state.tokens.len() + 1);
            state.tokens.insert(token.clone(), username.to_string());
            (200, auth_body(&token, username, &user, config))
        }
        ("POST", "/api/register/") => {
            let username = payload["username"].as_str().unwrap_or_default().to_string();
            if state.users.contains_key(&username) {
                return (400, json!({"username": ["A user with that username already exists."]}));
            }
            let account_number = payload["account_number"].as_str().unwrap_or_default().to_string();
            if state.users.values().any(|u| u.account_number == account_number) {
                return (400, json!({"error": "Account number already registered"}));
            }
            let balance = payload["balance"]
                .as_f64()
                .and_then(|b| Decimal::try_from(b).ok())
                .unwrap_or_default();
            let id = state.next_id;
            state.next_id += 1;
            let user = MockUser {
                id,
                password: payload["password"].as_str().unwrap_or_default().to_string(),
                email: payload["email"].as_str().unwrap_or_default().to_string(),
                account_number,
                balance,
                transactions: Vec::new(),
            };
            let token = format!("token-{}-{}", username, state.tokens.len() + 1);
            state.tokens.insert(token.clone(), username.clone());
            let body = auth_body(&token, &username, &user, config);
            state.users.insert(username, user);
            (201, body)
        }
        (_, "/api/dashboard/" | "/api/transactions/user/" | "/api/transaction/") => {
            let username = match bearer.and_then(|t| state.tokens.get(t)).cloned() {
                Some(u) if !config.fail_auth => u,
                _ => {
                    return (401, json!({"detail": "Given token not valid for any token type"}));
                }
            };
            let Some(user) = state.users.get_mut(&username) else {
                return (404, json!({"detail": "User not found"}));
            };
            match (method, path) {
                ("GET", "/api/dashboard/") => (
                    200,
                    json!({
                        "username": username,
                        "account_number": user.account_number,
                        "balance": money(user.balance, config),
                        "email": user.email,
                    }),
                ),
                ("GET", "/api/transactions/user/") => (200, JsonValue::Array(user.transactions.clone())),
                ("POST", "/api/transaction/") => create_transaction(user, payload, config),
                _ => (405, json!({"error": "Method not allowed"})),
            }
        }
        _ => (404, json!({"error": "Endpoint not found"})),
    }
}

fn create_transaction(user: &mut MockUser, payload: &JsonValue, config: &MockConfig) -> (u16, JsonValue) {
    let kind = payload["type"].as_str().unwrap_or_default();
    let amount = payload["amount"]
        .as_f64()
        .and_then(|a| Decimal::try_from(a).ok())
        .unwrap_or_default();

    if amount <= Decimal::ZERO {
        return (400, json!({"error": "Amount must be positive"}));
    }

    match kind {
        "credit" => user.balance += amount,
        "debit" => {
            if amount > user.balance {
                let mut body = json!({"error": "Insufficient balance for this debit"});
                if config.structured_errors {
                    body = json!({"error": "Not enough money", "code": "insufficient_balance"});
                }
                return (400, body);
            }
            user.balance -= amount;
        }
        _ => return (400, json!({"error": "Invalid transaction type"})),
    }

    // Ids follow the per-user history length
    let tx = json!({
        "id": user.transactions.len() + 1,
        "type": kind,
        "amount": money(amount, config),
        "timestamp": Utc::now().to_rfc3339(),
    });
    // Backend lists most recent first
    user.transactions.insert(0, tx.clone());
    (201, tx)
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::HttpBankApi;
    use crate::domain::result::Error;
    use crate::domain::{Credential, RegistrationRequest, TransactionType};
    use crate::ports::BankApi;

    fn server_with_alice(config: MockConfig) -> MockBankServer {
        let server = MockBankServer::start(config).unwrap();
        server.add_user("alice", "pw", "1234567890123456", Decimal::new(100000, 2));
        server
    }

    #[test]
    fn test_login_returns_session() {
        let server = server_with_alice(MockConfig::default());
        let api = HttpBankApi::new(&server.base_url()).unwrap();

        let session = api.login(&Credential::new("alice", "pw")).unwrap();
        assert!(!session.tokens.access.is_empty());
        assert!(!session.tokens.refresh.is_empty());
        assert_eq!(session.account.username, "alice");
        assert_eq!(session.account.masked_account_number(), "XXXXXXXXXX123456");
        assert_eq!(session.account.balance, Decimal::new(1000, 0));
    }

    #[test]
    fn test_login_rejected() {
        let server = server_with_alice(MockConfig::default());
        let api = HttpBankApi::new(&server.base_url()).unwrap();

        let err = api.login(&Credential::new("alice", "wrong")).unwrap_err();
        match err {
            Error::InvalidCredentials(detail) => assert!(detail.contains("No active account")),
            other => panic!("expected InvalidCredentials, got {:?}", other),
        }
    }

    #[test]
    fn test_register_then_duplicate() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let api = HttpBankApi::new(&server.base_url()).unwrap();
        let request = RegistrationRequest::new(
            Credential::new("bob", "hunter2"),
            "bob@example.com",
            "6543210987654321",
            Decimal::new(250, 0),
        );

        let session = api.register(&request).unwrap();
        assert_eq!(session.account.username, "bob");
        assert_eq!(session.account.balance, Decimal::new(250, 0));

        let err = api.register(&request).unwrap_err();
        match err {
            Error::Validation(msg) => assert!(msg.starts_with("username:")),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_dashboard_and_transactions_with_string_decimals() {
        let server = server_with_alice(MockConfig {
            decimal_strings: true,
            ..Default::default()
        });
        let api = HttpBankApi::new(&server.base_url()).unwrap();
        let session = api.login(&Credential::new("alice", "pw")).unwrap();
        let token = session.access_token();

        let created = api
            .submit_transaction(token, TransactionType::Credit, Decimal::new(2550, 2))
            .unwrap();
        assert_eq!(created.kind, TransactionType::Credit);
        assert_eq!(created.amount, Decimal::new(2550, 2));

        let snapshot = api.fetch_dashboard(token).unwrap();
        assert_eq!(snapshot.balance, Decimal::new(102550, 2));
        assert_eq!(snapshot.id, None);

        let history = api.fetch_transactions(token).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, created.id);
    }

    #[test]
    fn test_insufficient_balance_message() {
        let server = server_with_alice(MockConfig::default());
        let api = HttpBankApi::new(&server.base_url()).unwrap();
        let token = api.login(&Credential::new("alice", "pw")).unwrap().tokens.access;

        let err = api
            .submit_transaction(&token, TransactionType::Debit, Decimal::new(5000, 0))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance(_)), "{:?}", err);
        assert_eq!(server.balance_of("alice"), Some(Decimal::new(1000, 0)));
    }

    #[test]
    fn test_insufficient_balance_code() {
        let server = server_with_alice(MockConfig {
            structured_errors: true,
            ..Default::default()
        });
        let api = HttpBankApi::new(&server.base_url()).unwrap();
        let token = api.login(&Credential::new("alice", "pw")).unwrap().tokens.access;

        let err = api
            .submit_transaction(&token, TransactionType::Debit, Decimal::new(5000, 0))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance(_)), "{:?}", err);
    }

    #[test]
    fn test_unauthorized_token() {
        let server = server_with_alice(MockConfig::default());
        let api = HttpBankApi::new(&server.base_url()).unwrap();

        assert!(matches!(api.fetch_dashboard("bogus"), Err(Error::Unauthorized)));
        assert!(matches!(api.fetch_transactions("bogus"), Err(Error::Unauthorized)));
        assert!(matches!(
            api.submit_transaction("bogus", TransactionType::Credit, Decimal::ONE),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn test_request_timeout_is_network_error() {
        let server = server_with_alice(MockConfig {
            delay_ms: 1500,
            ..Default::default()
        });
        let api = HttpBankApi::with_timeout(&server.base_url(), std::time::Duration::from_millis(300))
            .unwrap();

        let err = api.fetch_dashboard("anything").unwrap_err();
        assert!(matches!(err, Error::Network(ref m) if m.contains("timed out")), "{:?}", err);
    }

    #[test]
    fn test_request_count() {
        let server = server_with_alice(MockConfig::default());
        let api = HttpBankApi::new(&server.base_url()).unwrap();
        let _ = api.login(&Credential::new("alice", "pw"));
        assert_eq!(server.request_count(), 1);
    }
}

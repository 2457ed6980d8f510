//! MK Bank REST client
//!
//! Blocking HTTP implementation of the [`BankApi`] port. Endpoints:
//!
//! - `POST /api/login/`
//! - `POST /api/register/`
//! - `GET  /api/dashboard/`
//! - `GET  /api/transactions/user/`
//! - `POST /api/transaction/`

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::blocking::Client;
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{
    AccountSnapshot, Credential, RegistrationRequest, Session, TokenPair, Transaction,
    TransactionType,
};
use crate::ports::BankApi;

/// Client-side deadline for a single request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(29);

/// Error code a backend may send instead of an "insufficient ..." message
pub const INSUFFICIENT_BALANCE_CODE: &str = "insufficient_balance";

// =============================================================================
// Wire models
// =============================================================================

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: TokenBody,
    user: UserBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access: String,
    #[serde(default)]
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    account_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    balance: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    account_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    balance: Option<Decimal>,
}

/// Transaction lists come back either bare or wrapped in an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransactionsResponse {
    List(Vec<TransactionBody>),
    Wrapped { transactions: Vec<TransactionBody> },
}

#[derive(Debug, Deserialize)]
struct TransactionBody {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(rename = "type")]
    kind: TransactionType,
    #[serde(deserialize_with = "deserialize_amount")]
    amount: Decimal,
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    account_number: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    balance: Decimal,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct TransactionRequest {
    #[serde(rename = "type")]
    kind: TransactionType,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

impl From<UserBody> for AccountSnapshot {
    fn from(user: UserBody) -> Self {
        AccountSnapshot::new(
            user.id,
            user.username.unwrap_or_default(),
            user.account_number.unwrap_or_default(),
            user.balance.unwrap_or_default(),
        )
    }
}

impl From<AuthResponse> for Session {
    fn from(body: AuthResponse) -> Self {
        Session::new(
            TokenPair::new(body.token.access, body.token.refresh),
            body.user.into(),
        )
    }
}

impl From<TransactionBody> for Transaction {
    fn from(body: TransactionBody) -> Self {
        Transaction::new(body.id, body.kind, body.amount, body.timestamp)
    }
}

/// Deserialize ID that can be number or string
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Deserialize optional ID that can be number or string
fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<JsonValue> = Option::deserialize(deserializer)?;
    match value {
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Null) | None => Ok(None),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

fn amount_from_json<E: serde::de::Error>(value: JsonValue) -> std::result::Result<Option<Decimal>, E> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| E::custom(format!("invalid decimal: {}", e))),
        JsonValue::String(s) if s.trim().is_empty() => Ok(None),
        JsonValue::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| E::custom(format!("invalid decimal: {}", e))),
        _ => Err(E::custom("expected number or string for amount")),
    }
}

/// Deserialize amount that can be number or string
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    amount_from_json::<D::Error>(value)?.ok_or_else(|| D::Error::custom("missing amount"))
}

/// Deserialize an optional balance; null and empty string mean absent
fn deserialize_optional_amount<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    amount_from_json::<D::Error>(value)
}

/// Deserialize an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Error bodies
// =============================================================================

/// Pull a human-readable message out of an error body.
///
/// Looks at `error`, then `detail`, then the first field error
/// (`{"field": ["message"]}`).
fn error_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    match value {
        JsonValue::String(s) => Some(s),
        JsonValue::Array(items) => items.into_iter().find_map(|v| v.as_str().map(String::from)),
        JsonValue::Object(map) => {
            for key in ["error", "detail", "message"] {
                if let Some(s) = map.get(key).and_then(|v| v.as_str()) {
                    return Some(s.to_string());
                }
            }
            map.iter().find_map(|(field, v)| {
                let msg = match v {
                    JsonValue::String(s) => Some(s.clone()),
                    JsonValue::Array(items) => items.iter().find_map(|i| i.as_str().map(String::from)),
                    _ => None,
                }?;
                if field == "non_field_errors" {
                    Some(msg)
                } else {
                    Some(format!("{}: {}", field, msg))
                }
            })
        }
        _ => None,
    }
}

/// Structured `code` field of an error body, if any
fn error_code(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    value.get("code")?.as_str().map(String::from)
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Classify a failed transaction submission.
///
/// Either the structured `insufficient_balance` code or "insufficient"
/// anywhere in the message (ignoring case) marks a balance rejection.
fn classify_transaction_error(status: StatusCode, body: &str) -> Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::Unauthorized;
    }
    let message = error_message(body).unwrap_or_else(|| status_text(status));
    let insufficient = error_code(body).as_deref() == Some(INSUFFICIENT_BALANCE_CODE)
        || message.to_lowercase().contains("insufficient");
    if insufficient {
        Error::InsufficientBalance(message)
    } else {
        Error::TransactionFailed(message)
    }
}

// =============================================================================
// HTTP client
// =============================================================================

/// HTTP client for the MK Bank backend
#[derive(Debug)]
pub struct HttpBankApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBankApi {
    /// Create a client with the default 29 second request timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid backend URL '{}': {}", base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Backend URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the status with the raw body.
    ///
    /// Only transport failures are errors here; status handling is left to
    /// each endpoint.
    fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<&B>,
    ) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method, &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| self.map_request_error(e))?;
        let status = response.status();
        let text = response.text().map_err(|e| self.map_request_error(e))?;
        Ok((status, text))
    }

    fn decode<T: DeserializeOwned>(&self, what: &str, body: &str) -> Result<T> {
        serde_json::from_str(body)
            .map_err(|e| Error::InvalidResponse(format!("Failed to parse {} response: {}", what, e)))
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::network(format!(
                "Request timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::network(format!("Unable to connect to MK Bank at {}", self.base_url))
        } else {
            Error::network(format!("MK Bank request failed: {}", error))
        }
    }

    /// Statuses outside an endpoint's own contract
    fn unexpected_status(&self, status: StatusCode, body: &str) -> Error {
        Error::Api {
            status: status.as_u16(),
            message: error_message(body).unwrap_or_else(|| status_text(status)),
        }
    }

    /// Shared handling for the two bearer-authenticated GET endpoints
    fn check_authorized(&self, status: StatusCode, body: &str) -> Result<()> {
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthorized),
            s => Err(self.unexpected_status(s, body)),
        }
    }
}

impl BankApi for HttpBankApi {
    fn login(&self, credential: &Credential) -> Result<Session> {
        let payload = LoginRequest {
            username: &credential.username,
            password: &credential.password,
        };
        let (status, body) = self.send(Method::POST, "/api/login/", None, Some(&payload))?;

        if status.is_success() {
            let auth: AuthResponse = self.decode("login", &body)?;
            return Ok(auth.into());
        }
        if status.is_client_error() {
            return Err(Error::InvalidCredentials(
                error_message(&body).unwrap_or_else(|| "Invalid username or password".to_string()),
            ));
        }
        Err(self.unexpected_status(status, &body))
    }

    fn register(&self, request: &RegistrationRequest) -> Result<Session> {
        let payload = RegisterBody {
            username: &request.credential.username,
            email: &request.email,
            account_number: &request.account_number,
            balance: request.balance,
            password: &request.credential.password,
        };
        let (status, body) = self.send(Method::POST, "/api/register/", None, Some(&payload))?;

        if status.is_success() {
            let auth: AuthResponse = self.decode("registration", &body)?;
            return Ok(auth.into());
        }
        if status.is_client_error() {
            return Err(Error::Validation(
                error_message(&body).unwrap_or_else(|| "Registration was rejected".to_string()),
            ));
        }
        Err(self.unexpected_status(status, &body))
    }

    fn fetch_dashboard(&self, access_token: &str) -> Result<AccountSnapshot> {
        let (status, body) =
            self.send::<JsonValue>(Method::GET, "/api/dashboard/", Some(access_token), None)?;
        self.check_authorized(status, &body)?;

        let data: DashboardResponse = self.decode("dashboard", &body)?;
        Ok(AccountSnapshot::new(
            None,
            data.username.unwrap_or_default(),
            data.account_number.unwrap_or_default(),
            data.balance.unwrap_or_default(),
        ))
    }

    fn fetch_transactions(&self, access_token: &str) -> Result<Vec<Transaction>> {
        let (status, body) = self.send::<JsonValue>(
            Method::GET,
            "/api/transactions/user/",
            Some(access_token),
            None,
        )?;
        self.check_authorized(status, &body)?;

        let items = match self.decode::<TransactionsResponse>("transactions", &body)? {
            TransactionsResponse::List(items) => items,
            TransactionsResponse::Wrapped { transactions } => transactions,
        };
        Ok(items.into_iter().map(Transaction::from).collect())
    }

    fn submit_transaction(
        &self,
        access_token: &str,
        kind: TransactionType,
        amount: Decimal,
    ) -> Result<Transaction> {
        let payload = TransactionRequest { kind, amount };
        let (status, body) = self.send(
            Method::POST,
            "/api/transaction/",
            Some(access_token),
            Some(&payload),
        )?;

        if !status.is_success() {
            return Err(classify_transaction_error(status, &body));
        }
        let created: TransactionBody = self.decode("transaction", &body)?;
        Ok(created.into())
    }
}

// =============================================================================
// Tests
// =============================================================================

//! REST client for the clinic API.
//!
//! Requests go through a [`Transport`], so the same client runs against
//! the real server ([`HttpTransport`]) or an in-memory fake (`MockApi`,
//! built for tests and behind the `test-util` feature).
//! The client owns the session store: it attaches the bearer token to
//! every request except login and drops the token when the server
//! rejects it.

mod http;
#[cfg(any(test, feature = "test-util"))]
mod mock;

pub use http::HttpTransport;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockApi;

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Value};
use thiserror::Error;

use crate::db::{SessionError, SessionStore, LAST_EMAIL_KEY};
use crate::entity::{Entity, RecordId};
use crate::models::{Statistics, User};

/// Fallback shown when a login fails without a server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path without leading slash, e.g. `factures/3`
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// Status code and decoded JSON body. An empty body decodes to `Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `message` field of an error body, if any.
    pub fn message(&self) -> Option<String> {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// The request never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Moves one request to the server and back.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    MissingToken,

    #[error("Session expired or rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("{0}")]
    LoginRejected(String),

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, String>,
    },

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    #[error("JSON parsing error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected response: {0}")]
    MalformedResponse(String),

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Whether the user has to log in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::MissingToken | ApiError::Unauthorized { .. })
    }

    /// Message suitable for a banner or form.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. } | ApiError::Server { message, .. } => {
                message.clone()
            }
            ApiError::LoginRejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Authenticated client over a transport and a session store.
pub struct ApiClient<T> {
    transport: T,
    session: SessionStore,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, session: SessionStore) -> Self {
        Self { transport, session }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn is_logged_in(&self) -> ApiResult<bool> {
        Ok(self.session.token()?.is_some())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a token and store it.
    pub fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let request = ApiRequest {
            method: Method::Post,
            path: "login".into(),
            bearer: None,
            body: Some(json!({ "email": email, "password": password })),
        };
        tracing::debug!(method = %request.method, path = %request.path, "Sending request");
        let response = self.transport.send(&request)?;

        if !response.is_success() {
            tracing::warn!(status = response.status, "Login rejected");
            let message = response
                .message()
                .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
            return Err(ApiError::LoginRejected(message));
        }

        let token = response
            .body
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::LoginRejected(LOGIN_FAILED_MESSAGE.to_string()))?;

        self.session.set_token(token)?;
        self.session.set(LAST_EMAIL_KEY, email)?;
        tracing::info!(email, "Logged in");
        Ok(())
    }

    /// Forget the stored token. Returns whether a session existed.
    pub fn logout(&self) -> ApiResult<bool> {
        let removed = self.session.clear_token()?;
        tracing::info!(had_session = removed, "Logged out");
        Ok(removed)
    }

    /// The logged-in user, used for role dispatch.
    pub fn current_user(&self) -> ApiResult<User> {
        let body = self.send(Method::Get, "user", None)?;
        Ok(serde_json::from_value(unwrap_item(body))?)
    }

    pub fn statistics(&self) -> ApiResult<Statistics> {
        let body = self.send(Method::Get, "statistiques", None)?;
        Ok(serde_json::from_value(unwrap_item(body))?)
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub fn list<E: Entity>(&self) -> ApiResult<Vec<E>> {
        let body = self.send(Method::Get, E::COLLECTION, None)?;
        let items = unwrap_list(body)?;
        Ok(serde_json::from_value(Value::Array(items))?)
    }

    /// Create a record. Returns the saved record as sent back by the server.
    pub fn create<E: Entity>(&self, draft: &E::Draft) -> ApiResult<Value> {
        let payload = serde_json::to_value(draft)?;
        let body = self.send(Method::Post, E::COLLECTION, Some(payload))?;
        Ok(unwrap_item(body))
    }

    pub fn update<E: Entity>(&self, id: RecordId, draft: &E::Draft) -> ApiResult<Value> {
        let payload = serde_json::to_value(draft)?;
        let path = format!("{}/{}", E::COLLECTION, id);
        let body = self.send(Method::Put, &path, Some(payload))?;
        Ok(unwrap_item(body))
    }

    pub fn delete<E: Entity>(&self, id: RecordId) -> ApiResult<()> {
        let path = format!("{}/{}", E::COLLECTION, id);
        self.send(Method::Delete, &path, None)?;
        Ok(())
    }

    /// Send an authenticated request and classify the response.
    fn send(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let token = self.session.token()?.ok_or(ApiError::MissingToken)?;
        let request = ApiRequest {
            method,
            path: path.to_string(),
            bearer: Some(token),
            body,
        };

        tracing::debug!(%method, path, "Sending request");
        let response = self.transport.send(&request)?;
        tracing::debug!(%method, path, status = response.status, "Received response");

        if response.is_success() {
            return Ok(response.body);
        }

        match response.status {
            401 | 419 => {
                tracing::warn!(status = response.status, "Session rejected, clearing token");
                self.session.clear_token()?;
                Err(ApiError::Unauthorized {
                    status: response.status,
                })
            }
            422 => Err(validation_error(&response)),
            status => {
                let message = response
                    .message()
                    .unwrap_or_else(|| format!("HTTP {}", status));
                tracing::warn!(%method, path, status, %message, "Request failed");
                Err(ApiError::Server { status, message })
            }
        }
    }
}

fn validation_error(response: &ApiResponse) -> ApiError {
    let mut errors = BTreeMap::new();
    if let Some(fields) = response.body.get("errors").and_then(Value::as_object) {
        for (field, value) in fields {
            let message = match value {
                Value::Array(messages) => messages
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                Value::String(message) => message.clone(),
                other => other.to_string(),
            };
            errors.insert(field.clone(), message);
        }
    }
    ApiError::Validation {
        message: response
            .message()
            .unwrap_or_else(|| "The given data was invalid.".to_string()),
        errors,
    }
}

/// Accept a bare array or a `{ "data": [...] }` envelope.
pub fn unwrap_list(body: Value) -> ApiResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ApiError::MalformedResponse(
                "expected a list or a data envelope".into(),
            )),
        },
        other => Err(ApiError::MalformedResponse(format!(
            "expected a list, got {}",
            other
        ))),
    }
}

/// Accept a bare object or a `{ "data": {...} }` envelope.
pub fn unwrap_item(body: Value) -> Value {
    match body {
        Value::Object(mut map)
            if map.len() == 1 && map.get("data").map_or(false, Value::is_object) =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    fn client(api: MockApi) -> ApiClient<MockApi> {
        ApiClient::new(api, SessionStore::open_in_memory().unwrap())
    }

    #[test]
    fn test_unwrap_list_shapes() {
        assert_eq!(unwrap_list(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(unwrap_list(json!({"data": [1]})).unwrap().len(), 1);
        assert!(matches!(
            unwrap_list(json!({"items": []})),
            Err(ApiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_unwrap_item_envelope() {
        assert_eq!(unwrap_item(json!({"data": {"id": 1}})), json!({"id": 1}));
        assert_eq!(unwrap_item(json!({"id": 1})), json!({"id": 1}));
    }

    #[test]
    fn test_missing_token_sends_nothing() {
        let api = client(MockApi::new());
        let err = api.list::<Patient>().unwrap_err();

        assert!(matches!(err, ApiError::MissingToken));
        assert!(err.is_auth());
        assert!(api.transport().requests().is_empty());
    }

    #[test]
    fn test_login_stores_token() {
        let api = client(MockApi::new().with_account("sec@clinic.test", "pw", "secretaire"));

        api.login("sec@clinic.test", "pw").unwrap();
        assert!(api.is_logged_in().unwrap());
        assert_eq!(
            api.session().get(LAST_EMAIL_KEY).unwrap().as_deref(),
            Some("sec@clinic.test")
        );

        // Login itself goes out without a bearer
        assert_eq!(api.transport().requests()[0].bearer, None);
    }

    #[test]
    fn test_login_failure_message() {
        let api = client(MockApi::new().with_account("sec@clinic.test", "pw", "secretaire"));

        let err = api.login("sec@clinic.test", "wrong").unwrap_err();
        assert!(matches!(err, ApiError::LoginRejected(ref m) if m == "Invalid credentials"));
        assert!(!api.is_logged_in().unwrap());
    }

    #[test]
    fn test_unauthorized_clears_token() {
        let api = client(MockApi::new().with_session("tok"));
        api.session().set_token("stale").unwrap();

        let err = api.list::<Patient>().unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status: 401 }));
        assert_eq!(api.session().token().unwrap(), None);
    }

    #[test]
    fn test_server_error_without_message() {
        let api = client(MockApi::new().with_session("tok"));
        api.session().set_token("tok").unwrap();
        api.transport().fail_next(503, "");

        let err = api.list::<Patient>().unwrap_err();
        assert_eq!(err.user_message(), "HTTP 503");
    }

    #[test]
    fn test_validation_messages_joined() {
        let response = ApiResponse::new(
            422,
            json!({
                "message": "The given data was invalid.",
                "errors": {"email": ["The email field is required.", "Really."]}
            }),
        );
        match validation_error(&response) {
            ApiError::Validation { errors, .. } => {
                assert_eq!(errors["email"], "The email field is required. Really.");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

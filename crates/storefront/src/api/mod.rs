//! REST gateway to the Shopfront backend.
//!
//! Every backend call goes through [`ApiClient`]: it resolves paths against
//! the configured base URL, attaches the session credential as a bearer token
//! and translates non-success answers into [`ClientError`]s. A `401` clears
//! the session before the error is returned.

mod commerce;
pub mod types;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result, clear_sentry_user};
use crate::session::SessionHandle;

pub use commerce::CommerceApi;

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Longest body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Shopfront REST API.
///
/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    session: SessionHandle,
}

impl ApiClient {
    /// Create a client for `config` sharing `session`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, session: SessionHandle) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("shopfront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                config,
                session,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Start a request to `path`, relative to the API base URL.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> ApiRequest {
        let url = self.inner.config.endpoint(path);
        let mut builder = self
            .inner
            .http
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        let credential = self.inner.session.credential();
        if let Some(token) = &credential {
            builder = builder.bearer_auth(token.expose_secret());
        }

        ApiRequest {
            client: self.clone(),
            builder,
            method,
            path: path.to_string(),
            authenticated: credential.is_some(),
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> ApiRequest {
        self.request(Method::GET, path)
    }

    #[must_use]
    pub fn post(&self, path: &str) -> ApiRequest {
        self.request(Method::POST, path)
    }

    #[must_use]
    pub fn put(&self, path: &str) -> ApiRequest {
        self.request(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> ApiRequest {
        self.request(Method::DELETE, path)
    }

    /// Forget the session after the backend rejected its credential.
    fn expire_session(&self) {
        if let Err(e) = self.inner.session.clear() {
            warn!(error = %e, "Failed to clear rejected session");
        }
        clear_sentry_user();
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.api_base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ApiRequest
// =============================================================================

/// A request being built against the API.
pub struct ApiRequest {
    client: ApiClient,
    builder: reqwest::RequestBuilder,
    method: Method,
    path: String,
    authenticated: bool,
}

impl ApiRequest {
    /// Append query parameters.
    #[must_use]
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    /// Send `body` as JSON.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    /// Send the request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, a non-success status, or a
    /// body that does not decode as `T`.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<T> {
        let path = self.path.clone();
        let body = self.execute().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                path = %path,
                error = %e,
                body = %truncate(&body),
                "Failed to decode API response"
            );
            ClientError::Decode(e)
        })
    }

    /// Send the request, ignoring the response body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure or a non-success status.
    pub async fn send(self) -> Result<()> {
        self.execute().await.map(drop)
    }

    #[instrument(skip(self), fields(method = %self.method, path = %self.path))]
    async fn execute(self) -> Result<String> {
        let response = self.builder.send().await?;
        let status = response.status();

        // Body as text first for better error diagnostics
        let body = response.text().await?;

        if status.is_success() {
            debug!(status = %status, "API request succeeded");
            return Ok(body);
        }

        let message = error_message(&body);
        match status {
            StatusCode::UNAUTHORIZED if self.authenticated => {
                warn!("Credential rejected, clearing session");
                self.client.expire_session();
                Err(ClientError::Unauthenticated(message))
            }
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden(message)),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(self.path)),
            _ => {
                if status.is_server_error() {
                    tracing::error!(
                        status = %status,
                        body = %truncate(&body),
                        "API returned non-success status"
                    );
                } else {
                    debug!(status = %status, message = %message, "API rejected request");
                }
                Err(ClientError::Api { status, message })
            }
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend reports errors as `{"detail": ...}` or `{"message": ...}`;
/// anything else yields an empty message.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return String::new();
    };
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::test_session;

    fn client() -> ApiClient {
        let config = ClientConfig::new("http://localhost:8080/api").unwrap();
        ApiClient::new(config, SessionHandle::in_memory()).unwrap()
    }

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail":"Email already registered","message":"x"}"#),
            "Email already registered"
        );
        assert_eq!(error_message(r#"{"message":" Out of stock "}"#), "Out of stock");
        assert_eq!(error_message(r#"{"status":500}"#), "");
        assert_eq!(error_message("<html>Bad Gateway</html>"), "");
    }

    #[test]
    fn test_truncate_limits_log_excerpt() {
        let long = "x".repeat(2_000);
        assert_eq!(truncate(&long).len(), LOG_BODY_LIMIT);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_request_attaches_bearer_and_request_id() {
        let api = client();
        api.session().establish(test_session("t0k3n")).unwrap();

        let request = api
            .put("/cart/items/7")
            .query(&[("quantity", 5)])
            .builder
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/api/cart/items/7?quantity=5"
        );
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Bearer t0k3n"
        );
        assert!(request.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[test]
    fn test_anonymous_request_has_no_authorization() {
        let request = client().get("catalog").builder.build().unwrap();
        assert_eq!(request.url().path(), "/api/catalog");
        assert!(!request.headers().contains_key(reqwest::header::AUTHORIZATION));
    }

    #[test]
    fn test_debug_hides_credential() {
        let api = client();
        api.session().establish(test_session("t0k3n")).unwrap();
        assert!(!format!("{api:?}").contains("t0k3n"));
    }
}

//! Integration tests for the Shopfront clients.
//!
//! Tests marked `#[ignore]` talk to a live backend and need:
//!
//! - `SHOPFRONT_API_BASE_URL` pointing at the REST backend
//! - `SHOPFRONT_TEST_EMAIL` / `SHOPFRONT_TEST_PASSWORD` for a shopper account
//! - `SHOPFRONT_ADMIN_EMAIL` / `SHOPFRONT_ADMIN_PASSWORD` for a staff account
//!
//! ```bash
//! cargo test -p shopfront-integration-tests -- --ignored
//! ```
//!
//! The remaining tests run offline against an address nothing listens on.

use secrecy::{ExposeSecret, SecretString};
use shopfront_storefront::services::AuthService;
use shopfront_storefront::{ApiClient, ClientConfig, SessionHandle};

/// Loopback address with no listener; every request fails to connect.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9";

/// Base URL for the backend (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("SHOPFRONT_API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080/api".to_string())
}

/// Account credentials read from `{prefix}_EMAIL` and `{prefix}_PASSWORD`.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    /// # Panics
    ///
    /// Panics if either variable is missing.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        let email = std::env::var(format!("{prefix}_EMAIL"))
            .unwrap_or_else(|_| panic!("{prefix}_EMAIL must be set"));
        let password = std::env::var(format!("{prefix}_PASSWORD"))
            .unwrap_or_else(|_| panic!("{prefix}_PASSWORD must be set"));
        Self {
            email,
            password: SecretString::from(password),
        }
    }

    #[must_use]
    pub fn shopper() -> Self {
        Self::from_env("SHOPFRONT_TEST")
    }

    #[must_use]
    pub fn staff() -> Self {
        Self::from_env("SHOPFRONT_ADMIN")
    }
}

/// Build an unauthenticated client for `base_url` with an in-memory session.
///
/// # Panics
///
/// Panics if the URL is invalid or the HTTP client cannot be built.
#[must_use]
pub fn client_for(base_url: &str) -> ApiClient {
    let config = ClientConfig::new(base_url).expect("Invalid base URL");
    ApiClient::new(config, SessionHandle::in_memory()).expect("Failed to create API client")
}

/// Build a client for the live backend and log in with `credentials`.
///
/// # Panics
///
/// Panics if login fails.
pub async fn logged_in_client(credentials: &Credentials) -> ApiClient {
    let client = client_for(&api_base_url());
    AuthService::new(client.clone(), client.session().clone())
        .login(&credentials.email, credentials.password.expose_secret())
        .await
        .expect("Login failed");
    client
}

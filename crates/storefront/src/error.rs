//! Unified error handling with Sentry integration.
//!
//! Every fallible client operation returns `Result<T, ClientError>`. Errors are
//! caught by the view that issued the call and turned into a [`Notice`]; none
//! propagate beyond the page. Request failures are captured to Sentry before
//! the notice is produced.

use reqwest::StatusCode;
use thiserror::Error;

use crate::notice::{Notice, Severity};
use crate::session::SessionError;
use crate::validation::ValidationError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected locally; no request was issued.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Missing, expired or rejected credential. The session has been cleared.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The backend refused the operation for this account.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: StatusCode,
        /// Message extracted from the response body.
        message: String,
    },

    /// Transport failure (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading or writing the persisted session failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Coarse error category, used to pick the recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Locally detected; block submission.
    Validation,
    /// Credential problem; the user must log in again.
    Authentication,
    /// Network or server failure; state left unchanged.
    Request,
    /// Not found or not allowed.
    Access,
}

impl ClientError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthenticated(_) => ErrorKind::Authentication,
            Self::Forbidden(_) | Self::NotFound(_) => ErrorKind::Access,
            Self::Api { .. } | Self::Http(_) | Self::Decode(_) | Self::Session(_) => {
                ErrorKind::Request
            }
        }
    }

    /// Whether the caller should send the user back to the login screen.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self.kind(), ErrorKind::Authentication)
    }

    /// Convert to a user-facing notice.
    ///
    /// `context` describes the failed action (e.g. "Could not update the
    /// quantity") and is used for request failures, whose details are never
    /// shown. Request failures are reported to Sentry here.
    #[must_use]
    pub fn notice(&self, context: &str) -> Notice {
        match self {
            Self::Validation(err) => Notice::new(Severity::Warning, err.to_string()),
            Self::Unauthenticated(_) => Notice::new(
                Severity::Error,
                "Your session has expired, please log in again",
            ),
            Self::Forbidden(_) => Notice::new(
                Severity::Error,
                "You are not allowed to perform this action",
            ),
            Self::NotFound(_) => Notice::new(Severity::Error, format!("{context}: not found")),
            Self::Api { status, message } if status.is_client_error() && !message.is_empty() => {
                Notice::new(Severity::Error, message.clone())
            }
            Self::Api { .. } | Self::Http(_) | Self::Decode(_) | Self::Session(_) => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );
                Notice::new(Severity::Error, context.to_string())
            }
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Call this after a successful login so errors are associated with the user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout or forced logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Updated line quantity", Some(&[("line_id", "7")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

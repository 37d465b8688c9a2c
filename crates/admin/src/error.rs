//! Unified error handling for admin.

use thiserror::Error;

use shopfront_storefront::ClientError;
use shopfront_storefront::notice::{Notice, Severity};

/// Error type for the administration views.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The signed-in role may not perform this action. Nothing was sent.
    #[error("Forbidden: {0}")]
    Denied(&'static str),

    /// The action does not apply to the selected record. Nothing was sent.
    #[error("Bad request: {0}")]
    NotApplicable(String),

    /// Local validation or a backend call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AdminError {
    /// Convert to a user-facing notice. See [`ClientError::notice`].
    #[must_use]
    pub fn notice(&self, context: &str) -> Notice {
        match self {
            Self::Denied(_) => Notice::new(
                Severity::Error,
                "You are not allowed to perform this action",
            ),
            Self::NotApplicable(reason) => Notice::new(Severity::Warning, reason.clone()),
            Self::Client(err) => err.notice(context),
        }
    }

    /// Whether the caller should send the user back to the login screen.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        match self {
            Self::Client(err) => err.requires_login(),
            Self::Denied(_) | Self::NotApplicable(_) => false,
        }
    }
}

impl From<shopfront_storefront::validation::ValidationError> for AdminError {
    fn from(err: shopfront_storefront::validation::ValidationError) -> Self {
        Self::Client(err.into())
    }
}

/// Result type alias for `AdminError`.
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_storefront::validation::ValidationError;

    #[test]
    fn test_denied_notice() {
        let notice = AdminError::Denied("change roles").notice("Could not change the role");
        assert_eq!(notice.message, "You are not allowed to perform this action");
        assert!(notice.is_error());
    }

    #[test]
    fn test_validation_passes_through() {
        let err = AdminError::from(ValidationError::MissingField("First name"));
        assert_eq!(err.notice("Could not save").message, "First name is required");
        assert!(!err.requires_login());
    }

    #[test]
    fn test_unauthenticated_requires_login() {
        let err = AdminError::from(ClientError::Unauthenticated("expired".to_string()));
        assert!(err.requires_login());
    }
}

//! Local form validation.
//!
//! Everything here runs before a request is built. A `ValidationError`
//! always means no HTTP call was issued.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use shopfront_core::Email;

/// Minimum password length accepted by registration, profile edit and reset.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Email pattern used by registration and password reset, aligned with the
/// backend's own check.
static STRICT_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.!#$%&'*+/=?^`{|}~-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid regex")
});

/// Input rejected before reaching the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Quantity must be a whole number")]
    QuantityNotANumber,
    #[error("Quantity must be at least 1")]
    QuantityTooLow,
    #[error("Only {available} units are available")]
    QuantityExceedsStock { available: u32 },
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Birth date must be a valid date (YYYY-MM-DD)")]
    InvalidBirthDate,
    #[error("The email does not match the one stored for this account")]
    EmailMismatch,
    #[error("A shipping address is required")]
    ShippingAddressRequired,
    #[error("No order has been initiated yet")]
    NoOrderInitiated,
}

/// Parse a quantity typed by the user.
///
/// # Errors
///
/// Returns `QuantityNotANumber` for non-numeric input and `QuantityTooLow`
/// for zero or negative values.
pub fn parse_quantity(raw: &str) -> Result<u32, ValidationError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::QuantityNotANumber)?;
    if value < 1 {
        return Err(ValidationError::QuantityTooLow);
    }
    u32::try_from(value).map_err(|_| ValidationError::QuantityNotANumber)
}

/// Check `quantity` against `[1, available]`.
///
/// # Errors
///
/// Returns `QuantityTooLow` or `QuantityExceedsStock`.
pub const fn check_quantity(quantity: u32, available: u32) -> Result<u32, ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::QuantityTooLow);
    }
    if quantity > available {
        return Err(ValidationError::QuantityExceedsStock { available });
    }
    Ok(quantity)
}

/// Validate the login email shape (`something@host.tld`).
///
/// # Errors
///
/// Returns `InvalidEmail` if the address is malformed.
pub fn login_email(raw: &str) -> Result<Email, ValidationError> {
    Email::parse(raw).map_err(|_| ValidationError::InvalidEmail)
}

/// Validate an email with the stricter registration pattern.
///
/// # Errors
///
/// Returns `InvalidEmail` if the address does not match.
pub fn strict_email(raw: &str) -> Result<Email, ValidationError> {
    let trimmed = raw.trim();
    if !STRICT_EMAIL.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail);
    }
    Email::parse(trimmed).map_err(|_| ValidationError::InvalidEmail)
}

/// Validate a new password and its confirmation.
///
/// # Errors
///
/// Returns `PasswordRequired`, `PasswordTooShort` or `PasswordMismatch`.
pub fn new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Validate an optional password change on the profile form.
///
/// Blank input means "keep the current password" and yields `None`.
///
/// # Errors
///
/// Returns `PasswordTooShort` if a non-blank password is under the minimum
/// length after trimming.
pub fn optional_password(raw: &str) -> Result<Option<String>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(Some(raw.to_string()))
}

/// Require a non-blank field, returning it trimmed.
///
/// # Errors
///
/// Returns `MissingField(name)` for blank input.
pub fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(name))
    } else {
        Ok(trimmed)
    }
}

/// Parse an ISO birth date. A trailing time component is ignored.
///
/// # Errors
///
/// Returns `InvalidBirthDate` if the first ten characters are not a date.
pub fn birth_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| ValidationError::InvalidBirthDate)
}

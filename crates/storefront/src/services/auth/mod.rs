//! Authentication service.
//!
//! Provides login, session restore and revalidation, registration, profile
//! edits and password reset. All checks a form can fail run before any
//! request is built.

use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::{info, instrument, warn};

use crate::api::CommerceApi;
use crate::api::types::{LoginRequest, PasswordReset, ProfileUpdate, RegisterRequest, UserProfile};
use crate::error::{ClientError, Result, clear_sentry_user, set_sentry_user};
use crate::session::{Session, SessionHandle};
use crate::validation::{
    ValidationError, birth_date, login_email, new_password, optional_password, required,
    strict_email,
};

/// Registration form as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birth_date: String,
    pub shipping_address: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Profile edit form. A blank password keeps the current one.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    /// Must equal the signed-in account's email.
    pub email: String,
    pub shipping_address: String,
    pub birth_date: String,
    pub password: String,
}

impl ProfileForm {
    /// Prefill the form from `profile`.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.to_string(),
            shipping_address: profile.shipping_address.clone().unwrap_or_default(),
            birth_date: profile
                .birth_date
                .as_deref()
                .and_then(|d| d.get(..10))
                .unwrap_or_default()
                .to_string(),
            password: String::new(),
        }
    }
}

/// Password reset form.
#[derive(Debug, Clone, Default)]
pub struct PasswordResetForm {
    pub email: String,
    pub reset_code: String,
    pub new_password: String,
    pub confirmation: String,
}

/// Authentication service.
///
/// Owns every write to the session apart from the forced logout the API
/// gateway performs on a rejected credential.
pub struct AuthService<A> {
    api: A,
    session: SessionHandle,
}

impl<A: CommerceApi> AuthService<A> {
    #[must_use]
    pub const fn new(api: A, session: SessionHandle) -> Self {
        Self { api, session }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email or blank password, or the
    /// request error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = login_email(email)?;
        if password.is_empty() {
            return Err(ValidationError::PasswordRequired.into());
        }

        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        let profile = response.user;
        self.session
            .establish(Session::new(response.token, profile.clone()))?;
        set_sentry_user(&profile.id, Some(profile.email.as_str()));
        info!(user_id = %profile.id, "Logged in");
        Ok(profile)
    }

    /// Load the persisted session, dropping it if its token is unreadable or
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns `Session` if the store cannot be read or cleared.
    #[instrument(skip(self))]
    pub fn restore(&self) -> Result<Option<UserProfile>> {
        let Some(session) = self.session.restore()? else {
            return Ok(None);
        };

        match session.claims() {
            Some(claims) if !claims.is_expired(Utc::now()) => {
                set_sentry_user(&session.profile.id, Some(session.profile.email.as_str()));
                Ok(Some(session.profile))
            }
            Some(_) => {
                info!("Stored token has expired");
                self.logout()?;
                Ok(None)
            }
            None => {
                warn!("Stored token is not readable");
                self.logout()?;
                Ok(None)
            }
        }
    }

    /// Ask the backend whether the stored token still belongs to the stored
    /// account. Any failure or mismatch ends the session.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when the session was ended, or `Session` if
    /// it could not be cleared.
    #[instrument(skip(self))]
    pub async fn revalidate(&self) -> Result<()> {
        let Some(session) = self.session.current() else {
            return Err(ClientError::Unauthenticated("not signed in".to_string()));
        };

        let reason = match self
            .api
            .validate_token(session.credential.expose_secret())
            .await
        {
            Ok(validated)
                if validated
                    .email
                    .trim()
                    .eq_ignore_ascii_case(session.profile.email.as_str()) =>
            {
                return Ok(());
            }
            Ok(_) => "token belongs to a different account".to_string(),
            Err(err) => err.to_string(),
        };

        warn!(reason = %reason, "Session failed revalidation");
        self.logout()?;
        Err(ClientError::Unauthenticated(reason))
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns `Session` if the store cannot be cleared.
    pub fn logout(&self) -> Result<()> {
        clear_sentry_user();
        self.session.clear()?;
        Ok(())
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank field, a malformed email or birth
    /// date, or a weak or mismatched password; otherwise the request error.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<()> {
        let first_name = required(&form.first_name, "First name")?;
        let last_name = required(&form.last_name, "Last name")?;
        required(&form.email, "Email")?;
        let email = strict_email(&form.email)?;
        required(&form.birth_date, "Birth date")?;
        let born = birth_date(&form.birth_date)?;
        let shipping_address = required(&form.shipping_address, "Shipping address")?;
        new_password(&form.password, &form.password_confirmation)?;

        self.api
            .register(&RegisterRequest {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                birth_date: born.format("%Y-%m-%d").to_string(),
                shipping_address: shipping_address.to_string(),
                password: form.password.clone(),
            })
            .await?;
        info!("Account registered");
        Ok(())
    }

    /// Update the signed-in user's profile and replace the stored one with
    /// the backend's answer.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` without a session, `Validation` for a form
    /// problem, or the request error.
    #[instrument(skip(self, form))]
    pub async fn update_profile(&self, form: &ProfileForm) -> Result<UserProfile> {
        let Some(current) = self.session.profile() else {
            return Err(ClientError::Unauthenticated("not signed in".to_string()));
        };
        if !form.email.trim().eq_ignore_ascii_case(current.email.as_str()) {
            return Err(ValidationError::EmailMismatch.into());
        }
        let first_name = required(&form.first_name, "First name")?;
        let last_name = required(&form.last_name, "Last name")?;
        let shipping_address = required(&form.shipping_address, "Shipping address")?;
        let born = birth_date(&form.birth_date)?;
        let password = optional_password(&form.password)?;

        let updated = self
            .api
            .update_profile(&ProfileUpdate {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                shipping_address: shipping_address.to_string(),
                birth_date: born.format("%Y-%m-%d").to_string(),
                password,
            })
            .await?;

        self.session.replace_profile(updated.clone())?;
        info!(user_id = %updated.id, "Profile updated");
        Ok(updated)
    }

    /// Ask for a reset code to be sent to `email`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email, or the request error.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = strict_email(email)?;
        self.api.request_password_reset(email.as_str()).await
    }

    /// Set a new password using a reset code.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email, blank code, or weak or
    /// mismatched password; otherwise the request error.
    pub async fn reset_password(&self, form: &PasswordResetForm) -> Result<()> {
        let email = strict_email(&form.email)?;
        let reset_code = required(&form.reset_code, "Reset code")?;
        new_password(&form.new_password, &form.confirmation)?;

        self.api
            .reset_password(&PasswordReset {
                email: email.to_string(),
                reset_code: reset_code.to_string(),
                new_password: form.new_password.clone(),
            })
            .await
    }
}

//! The process-wide session: bearer credential plus the user's profile.
//!
//! A [`SessionHandle`] is cheap to clone and shared by the API gateway and
//! every view. It keeps the current session in memory and writes through to
//! a [`SessionStore`] so a restart can pick it up again.

mod store;
mod token;

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};

pub use store::{FileSessionStore, MemorySessionStore, SessionStore, TOKEN_KEY, USER_KEY};
pub use token::{TokenClaims, TokenError};

#[cfg(test)]
pub(crate) use token::unsigned_token;

use crate::api::types::UserProfile;
use crate::config::ClientConfig;

/// Errors reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored profile is corrupt: {0}")]
    Corrupt(serde_json::Error),
}

/// An authenticated session.
#[derive(Clone)]
pub struct Session {
    pub credential: SecretString,
    pub profile: UserProfile,
}

impl Session {
    #[must_use]
    pub fn new(credential: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            credential: SecretString::from(credential.into()),
            profile,
        }
    }

    /// Decoded token claims, if the credential is a readable JWT.
    #[must_use]
    pub fn claims(&self) -> Option<TokenClaims> {
        TokenClaims::decode(self.credential.expose_secret()).ok()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("credential", &"[REDACTED]")
            .field("profile", &self.profile.email)
            .finish()
    }
}

/// Shared access to the current session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionHandleInner>,
}

struct SessionHandleInner {
    store: Box<dyn SessionStore>,
    current: RwLock<Option<Session>>,
}

impl SessionHandle {
    /// Create a handle over `store`. Nothing is loaded until [`restore`](Self::restore).
    #[must_use]
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            inner: Arc::new(SessionHandleInner {
                store: Box::new(store),
                current: RwLock::new(None),
            }),
        }
    }

    /// A handle whose session lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    /// File-backed when a session directory is configured, in-memory otherwise.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        match &config.session_dir {
            Some(dir) => Self::new(FileSessionStore::new(dir)),
            None => Self::in_memory(),
        }
    }

    /// Load the persisted session into memory.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be read.
    #[instrument(skip(self))]
    pub fn restore(&self) -> Result<Option<Session>, SessionError> {
        let session = self.inner.store.load()?;
        debug!(found = session.is_some(), "Restored session");
        *self.write() = session.clone();
        Ok(session)
    }

    /// The current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// The bearer credential, if a session exists.
    #[must_use]
    pub fn credential(&self) -> Option<SecretString> {
        self.read().as_ref().map(|s| s.credential.clone())
    }

    /// The stored profile, if a session exists.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|s| s.profile.clone())
    }

    /// Decoded claims of the current credential.
    #[must_use]
    pub fn claims(&self) -> Option<TokenClaims> {
        self.read().as_ref().and_then(Session::claims)
    }

    /// Persist and activate `session`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be written.
    pub fn establish(&self, session: Session) -> Result<(), SessionError> {
        self.inner.store.save(&session)?;
        *self.write() = Some(session);
        Ok(())
    }

    /// Replace the stored profile, keeping the credential.
    ///
    /// Does nothing when there is no session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be written.
    pub fn replace_profile(&self, profile: UserProfile) -> Result<(), SessionError> {
        let mut current = self.write();
        if let Some(session) = current.as_mut() {
            let updated = Session {
                credential: session.credential.clone(),
                profile,
            };
            self.inner.store.save(&updated)?;
            *session = updated;
        }
        Ok(())
    }

    /// Drop the session from memory and storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be cleared. The in-memory
    /// session is dropped regardless.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), SessionError> {
        *self.write() = None;
        debug!("Cleared session");
        self.inner.store.clear()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.inner.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.inner.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// A profile for `ana@example.com`, for tests.
#[cfg(test)]
pub(crate) fn test_profile() -> UserProfile {
    serde_json::from_value(serde_json::json!({
        "id": 5,
        "firstName": "Ana",
        "lastName": "Pérez",
        "email": "ana@example.com",
        "shippingAddress": "Calle 1, Madrid",
        "birthDate": "1990-04-12",
        "roles": [{"name": "USER"}]
    }))
    .unwrap_or_else(|e| panic!("test profile: {e}"))
}

/// A session for `ana@example.com` with the given credential, for tests.
#[cfg(test)]
pub(crate) fn test_session(credential: &str) -> Session {
    Session::new(credential, test_profile())
}

//! Persistence backends for the session.
//!
//! The session is the only state that outlives a view. It is stored as two
//! entries, `token` (the bearer credential) and `user` (the profile as JSON),
//! and both are removed together on logout, expiry or mismatch.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};

use super::{Session, SessionError};
use crate::api::types::UserProfile;

/// Storage key for the bearer credential.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the serialized profile.
pub const USER_KEY: &str = "user";

/// Get/set/clear access to the persisted session.
///
/// Views never touch a store directly; they go through
/// [`SessionHandle`](super::SessionHandle).
pub trait SessionStore: Send + Sync {
    /// Read the persisted session, if both entries are present.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backing storage cannot be read or the
    /// profile entry is corrupt.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    /// Persist `session`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backing storage cannot be written.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove both entries. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the backing storage cannot be modified.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session store kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entry: Mutex<Option<(String, String)>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry
            .as_ref()
            .map(|(token, user)| decode(token, user))
            .transpose()
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        let user = serde_json::to_string(&session.profile).map_err(SessionError::Corrupt)?;
        let token = session.credential.expose_secret().to_string();
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = Some((token, user));
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Session store backed by two files in a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Store files under `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let Some(token) = read_optional(&self.path(TOKEN_KEY))? else {
            return Ok(None);
        };
        let Some(user) = read_optional(&self.path(USER_KEY))? else {
            return Ok(None);
        };
        decode(token.trim(), &user).map(Some)
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir)?;
        let user = serde_json::to_string(&session.profile).map_err(SessionError::Corrupt)?;
        std::fs::write(self.path(TOKEN_KEY), session.credential.expose_secret())?;
        std::fs::write(self.path(USER_KEY), user)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        for key in [TOKEN_KEY, USER_KEY] {
            match std::fs::remove_file(self.path(key)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, SessionError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn decode(token: &str, user: &str) -> Result<Session, SessionError> {
    let profile: UserProfile = serde_json::from_str(user).map_err(SessionError::Corrupt)?;
    Ok(Session {
        credential: SecretString::from(token.to_string()),
        profile,
    })
}

//! Display-only decoding of the access token.
//!
//! The credential is a JWT. The client reads its payload to show or hide
//! navigation and to notice expiry early; it never verifies the signature, so
//! nothing decoded here may gate a security-relevant decision.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use shopfront_core::RoleSet;

/// Errors decoding a token payload.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Roles may be encoded as a delimited string or as an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RolesClaim {
    Delimited(String),
    List(Vec<String>),
}

/// Claims the client cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject, usually the account email.
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    roles: Option<RolesClaim>,
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload segment of `token`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is not a JWT or its payload is not
    /// base64url-encoded JSON.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let mut parts = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Roles named in the claim, case-normalised.
    #[must_use]
    pub fn roles(&self) -> RoleSet {
        match &self.roles {
            Some(RolesClaim::Delimited(claim)) => RoleSet::from_claim(claim),
            Some(RolesClaim::List(names)) => names.iter().filter_map(|n| n.parse().ok()).collect(),
            None => RoleSet::default(),
        }
    }

    /// Whether the token has expired at `now`. A token without `exp` counts
    /// as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_none_or(|exp| exp <= now.timestamp())
    }
}

/// Build an unsigned token with the given payload, for tests.
#[cfg(test)]
pub(crate) fn unsigned_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

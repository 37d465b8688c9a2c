//! Shopfront storefront client.
//!
//! Talks to the Shopfront REST backend on behalf of a shopper: session
//! handling, catalog browsing, the shared cart, checkout and order history.
//! The administration screens live in `shopfront-admin` and reuse the API
//! gateway, session and error types from this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notice;
pub mod services;
pub mod session;
pub mod telemetry;
pub mod validation;
pub mod views;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

pub use api::{ApiClient, CommerceApi};
pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind, Result};
pub use notice::{Notice, Severity};
pub use session::{Session, SessionHandle};

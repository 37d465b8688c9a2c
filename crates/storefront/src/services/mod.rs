//! Services that own session-level flows.
//!
//! # Services
//!
//! - `auth` - Login, restore/revalidate, logout, registration, profile and password reset

pub mod auth;

pub use auth::{AuthService, PasswordResetForm, ProfileForm, RegistrationForm};

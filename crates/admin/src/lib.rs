//! Shopfront administration views.
//!
//! Role-gated screens for staff: the user directory (read-only for workers,
//! editable by administrators) and the order board with forced status
//! changes. Built on the API gateway and session of `shopfront-storefront`.
//!
//! # Access
//!
//! Roles are read from the session for display only. Every request is
//! authorised again by the backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod api;
pub mod error;
pub mod orders;
pub mod users;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

pub use access::{StaffRole, status_options};
pub use api::{AdminApi, RoleRecord, UserEdit};
pub use error::{AdminError, Result};
pub use orders::{AdminOrdersState, AdminOrdersView, StatusChange};
pub use users::{UserCommand, UserEditForm, UsersState, UsersView};

//! Which administrative actions the signed-in role may take.
//!
//! Decided from the unverified token claim for display purposes. The backend
//! enforces the same rules on every request.

use shopfront_core::{OrderStatus, Role};
use shopfront_storefront::SessionHandle;
use shopfront_storefront::views::session_roles;

/// Fallback audit name when the session has no profile.
const DEFAULT_ACTOR: &str = "Admin";

/// A role that can open the administration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRole {
    Admin,
    Worker,
}

impl StaffRole {
    /// Highest staff role in the session, ADMIN taking precedence.
    #[must_use]
    pub fn from_session(session: &SessionHandle) -> Option<Self> {
        let roles = session_roles(session);
        if roles.contains(Role::Admin) {
            Some(Self::Admin)
        } else if roles.contains(Role::Worker) {
            Some(Self::Worker)
        } else {
            None
        }
    }

    /// Only administrators edit users, change roles and (de)activate accounts.
    #[must_use]
    pub const fn can_manage_users(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role may move an order to `status`.
    #[must_use]
    pub const fn can_set_status(self, status: OrderStatus) -> bool {
        !matches!((self, status), (Self::Worker, OrderStatus::Cancelled))
    }
}

/// Statuses `role` may select as an order's new status.
#[must_use]
pub fn status_options(role: StaffRole) -> Vec<OrderStatus> {
    OrderStatus::ALL
        .into_iter()
        .filter(|status| role.can_set_status(*status))
        .collect()
}

/// Name recorded as `performedBy` for mutations from `session`.
#[must_use]
pub fn actor(session: &SessionHandle) -> String {
    session
        .profile()
        .map_or_else(|| DEFAULT_ACTOR.to_string(), |p| p.email.to_string())
}

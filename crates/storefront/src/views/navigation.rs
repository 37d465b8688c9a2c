//! Role-derived navigation.
//!
//! Roles come from the unverified token payload, falling back to the roles
//! on the stored profile. They only decide what is shown; the backend checks
//! every privileged request on its own.

use shopfront_core::{Role, RoleSet};

use crate::session::SessionHandle;

/// A navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEntry {
    Catalog,
    Cart,
    Orders,
    Profile,
    AdminUsers,
    AdminOrders,
    Login,
    Register,
}

impl NavEntry {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Catalog => "Catalog",
            Self::Cart => "Cart",
            Self::Orders => "My Orders",
            Self::Profile => "Profile",
            Self::AdminUsers => "Users",
            Self::AdminOrders => "Manage Orders",
            Self::Login => "Log in",
            Self::Register => "Register",
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::AdminUsers | Self::AdminOrders)
    }
}

/// What the navigation shows for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub entries: Vec<NavEntry>,
    /// Short display name of the signed-in user.
    pub user_label: Option<String>,
    /// Highest role held, if any.
    pub role: Option<Role>,
}

impl Navigation {
    #[must_use]
    pub fn shows_admin(&self) -> bool {
        self.entries.iter().any(NavEntry::is_admin)
    }
}

/// Roles to display for the session: the token's claim, else the profile's.
#[must_use]
pub fn session_roles(session: &SessionHandle) -> RoleSet {
    let from_token = session.claims().map(|c| c.roles()).unwrap_or_default();
    if !from_token.is_empty() {
        return from_token;
    }
    session
        .profile()
        .map(|p| p.role_set())
        .unwrap_or_default()
}

/// Build the navigation for `session`.
#[must_use]
pub fn navigation(session: &SessionHandle) -> Navigation {
    let Some(profile) = session.profile() else {
        return Navigation {
            entries: vec![NavEntry::Catalog, NavEntry::Login, NavEntry::Register],
            user_label: None,
            role: None,
        };
    };

    let roles = session_roles(session);
    let mut entries = vec![
        NavEntry::Catalog,
        NavEntry::Cart,
        NavEntry::Orders,
        NavEntry::Profile,
    ];
    if roles.has_staff_role() {
        entries.extend([NavEntry::AdminUsers, NavEntry::AdminOrders]);
    }

    Navigation {
        entries,
        user_label: Some(profile.short_name()),
        role: roles.highest(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{Session, test_profile, unsigned_token};
    use serde_json::json;

    fn with_token_roles(roles: &str) -> SessionHandle {
        let session = SessionHandle::in_memory();
        let token = unsigned_token(&json!({"sub": "ana@example.com", "roles": roles}));
        session.establish(Session::new(token, test_profile())).unwrap();
        session
    }

    #[test]
    fn test_admin_and_user_shows_admin_entries() {
        let nav = navigation(&with_token_roles("ADMIN,USER"));
        assert!(nav.shows_admin());
        assert_eq!(nav.role, Some(Role::Admin));
        assert_eq!(nav.user_label.as_deref(), Some("Ana Pérez"));
    }

    #[test]
    fn test_user_alone_hides_admin_entries() {
        assert!(!navigation(&with_token_roles("USER")).shows_admin());
        assert!(!navigation(&with_token_roles("user")).shows_admin());
    }

    #[test]
    fn test_role_case_is_ignored() {
        assert!(navigation(&with_token_roles("admin, user")).shows_admin());
        assert!(navigation(&with_token_roles("Worker")).shows_admin());
    }

    #[test]
    fn test_profile_roles_when_token_has_none() {
        let session = SessionHandle::in_memory();
        let mut profile = test_profile();
        profile.roles = serde_json::from_value(json!([{"name": "WORKER"}])).unwrap();
        session.establish(Session::new("opaque-token", profile)).unwrap();

        let nav = navigation(&session);
        assert!(nav.shows_admin());
        assert_eq!(nav.role, Some(Role::Worker));
    }

    #[test]
    fn test_signed_out_navigation() {
        let nav = navigation(&SessionHandle::in_memory());
        assert_eq!(nav.entries, vec![NavEntry::Catalog, NavEntry::Login, NavEntry::Register]);
        assert!(nav.user_label.is_none());
    }
}

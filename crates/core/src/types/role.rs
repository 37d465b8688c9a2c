//! Account roles.
//!
//! Roles reach the client two ways: as a comma-delimited claim inside the
//! access token (`"ADMIN,USER"`) and as a list of `{ "name": ... }` objects on
//! the stored profile. Both are display hints only; the backend re-checks
//! every privileged request.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A role recognised by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Back-office staff: order handling, read-only user lists.
    Worker,
    /// Regular customer.
    User,
}

impl Role {
    /// Wire name, e.g. `ADMIN`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Worker => "WORKER",
            Self::User => "USER",
        }
    }

    /// Whether this role unlocks the administration section.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Worker)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "WORKER" => Ok(Self::Worker),
            "USER" => Ok(Self::User),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// The set of roles held by one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// Parse a delimited role claim such as `"admin, USER"`.
    ///
    /// Case is normalised, whitespace trimmed, and unknown names ignored.
    #[must_use]
    pub fn from_claim(claim: &str) -> Self {
        claim.split(',').filter_map(|part| part.parse().ok()).collect()
    }

    /// Whether the set contains `role`.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether any role in the set is staff (ADMIN or WORKER).
    #[must_use]
    pub fn has_staff_role(&self) -> bool {
        self.0.iter().any(Role::is_staff)
    }

    /// The most privileged role held: ADMIN over WORKER over USER.
    #[must_use]
    pub fn highest(&self) -> Option<Role> {
        self.0.iter().copied().min()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut roles: Vec<Role> = Vec::new();
        for role in iter {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Self(roles)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_with_admin_is_staff() {
        let roles = RoleSet::from_claim("ADMIN,USER");
        assert!(roles.has_staff_role());
        assert_eq!(roles.highest(), Some(Role::Admin));
    }

    #[test]
    fn test_user_claim_is_not_staff() {
        assert!(!RoleSet::from_claim("USER").has_staff_role());
        assert!(!RoleSet::from_claim("user").has_staff_role());
    }

    #[test]
    fn test_claim_case_and_whitespace_are_normalised() {
        let roles = RoleSet::from_claim(" worker , User ");
        assert!(roles.contains(Role::Worker));
        assert!(roles.contains(Role::User));
        assert_eq!(roles.highest(), Some(Role::Worker));
    }

    #[test]
    fn test_unknown_roles_are_ignored() {
        let roles = RoleSet::from_claim("GUEST,,");
        assert!(roles.is_empty());
        assert_eq!(roles.highest(), None);
    }

    #[test]
    fn test_duplicates_collapse() {
        let roles = RoleSet::from_claim("ADMIN,admin");
        assert_eq!(roles, RoleSet::from_claim("ADMIN"));
    }
}

//! Roles and primary-role precedence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role as carried in the token's `roles` claim.
///
/// `None` marks an account whose KYC onboarding is not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    None,
    Customer,
    Employee,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::None => "NONE",
            Role::Customer => "CUSTOMER",
            Role::Employee => "EMPLOYEE",
            Role::Admin => "ADMIN",
        }
    }

    /// True for roles that land in the admin area.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Employee | Role::Admin)
    }

    /// Derive the single role used for dashboard routing.
    ///
    /// `NONE` dominates everything else. Otherwise ADMIN, then EMPLOYEE,
    /// then CUSTOMER. A set with no recognised role is treated as `NONE`.
    pub fn primary<S: AsRef<str>>(roles: &[S]) -> Role {
        let mut best: Option<Role> = None;
        for role in roles.iter().filter_map(|r| r.as_ref().parse::<Role>().ok()) {
            if role == Role::None {
                return Role::None;
            }
            if best.map_or(true, |b| role.rank() > b.rank()) {
                best = Some(role);
            }
        }
        best.unwrap_or(Role::None)
    }

    fn rank(self) -> u8 {
        match self {
            Role::None => 0,
            Role::Customer => 1,
            Role::Employee => 2,
            Role::Admin => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Role::None),
            "CUSTOMER" => Ok(Role::Customer),
            "EMPLOYEE" => Ok(Role::Employee),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

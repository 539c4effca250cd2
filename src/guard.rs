// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guards: pure allow/redirect decisions for the view router.
//!
//! Guards never block and never fail. Every (state, guard) pair maps to
//! exactly one [`Decision`].

use crate::auth::{AuthState, Role};

/// Redirect targets the surrounding router must register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub sign_in: String,
    pub kyc: String,
    pub customer_dashboard: String,
    pub admin_dashboard: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            sign_in: "/signin".to_string(),
            kyc: "/kyc".to_string(),
            customer_dashboard: "/customer/dashboard".to_string(),
            admin_dashboard: "/admin/dashboard".to_string(),
        }
    }
}

impl Routes {
    /// Home view for a primary role. Staff roles share the admin dashboard.
    pub fn dashboard_for_role(&self, role: Role) -> &str {
        match role {
            Role::None => &self.kyc,
            Role::Customer => &self.customer_dashboard,
            Role::Employee | Role::Admin => &self.admin_dashboard,
        }
    }
}

/// Guard kinds attached to protected views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Signed in, and holding the role when one is given.
    RequireRole(Option<Role>),
    /// Signed in, and holding at least one of the roles.
    RequireAnyRole(Vec<Role>),
    /// Only for accounts whose KYC onboarding is incomplete.
    KycOnly,
}

impl Guard {
    pub fn signed_in() -> Self {
        Guard::RequireRole(None)
    }

    pub fn role(role: Role) -> Self {
        Guard::RequireRole(Some(role))
    }
}

/// Where to send a visitor who may not see the requested view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    /// Originally requested location, so sign-in can send the user back.
    pub return_to: Option<String>,
}

impl Redirect {
    fn to(path: &str) -> Self {
        Self {
            path: path.to_string(),
            return_to: None,
        }
    }

    /// Target with the return location appended as `?redirect=`.
    pub fn location(&self) -> String {
        match &self.return_to {
            Some(from) => format!("{}?redirect={}", self.path, urlencoding::encode(from)),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(Redirect),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectTo(r) => Some(&r.path),
        }
    }
}

/// Decide whether `state` may see `requested` under `guard`.
pub fn evaluate(state: &AuthState, guard: &Guard, requested: &str, routes: &Routes) -> Decision {
    if !state.authenticated {
        return Decision::RedirectTo(Redirect {
            path: routes.sign_in.clone(),
            return_to: Some(requested.to_string()),
        });
    }

    let primary = state.primary_role.unwrap_or(Role::None);

    let allowed = match guard {
        Guard::RequireRole(None) => true,
        Guard::RequireRole(Some(role)) => state.has_role(*role),
        Guard::RequireAnyRole(roles) => roles.iter().any(|r| state.has_role(*r)),
        Guard::KycOnly => primary == Role::None,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::RedirectTo(Redirect::to(routes.dashboard_for_role(primary)))
    }
}

/// Where to go right after signing in.
///
/// A carried return location wins when it is a local path other than the
/// sign-in page; otherwise the role's home view. Guards still apply on
/// arrival.
pub fn landing_path(state: &AuthState, return_to: Option<&str>, routes: &Routes) -> String {
    if !state.authenticated {
        return routes.sign_in.clone();
    }

    if let Some(target) = return_to.filter(|t| is_local_path(t)) {
        let path = target.split(['?', '#']).next().unwrap_or(target);
        if path != routes.sign_in {
            return target.to_string();
        }
    }

    routes
        .dashboard_for_role(state.primary_role.unwrap_or(Role::None))
        .to_string()
}

/// Extract the `redirect` parameter from a sign-in query string.
pub fn return_to_from_query(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "redirect")
        .and_then(|(_, v)| urlencoding::decode(v).ok())
        .map(|v| v.into_owned())
        .filter(|v| is_local_path(v))
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

/// Guard assignments for view paths, matched by longest prefix.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(String, Guard)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard banking layout: customer area, staff area, onboarding.
    pub fn banking(routes: &Routes) -> Self {
        Self::new()
            .guard(&routes.kyc, Guard::KycOnly)
            .guard("/customer", Guard::role(Role::Customer))
            .guard(&routes.customer_dashboard, Guard::role(Role::Customer))
            .guard("/admin", Guard::RequireAnyRole(vec![Role::Admin, Role::Employee]))
            .guard(
                &routes.admin_dashboard,
                Guard::RequireAnyRole(vec![Role::Admin, Role::Employee]),
            )
            .guard("/profile", Guard::signed_in())
    }

    pub fn guard(mut self, prefix: &str, guard: Guard) -> Self {
        self.entries.push((prefix.trim_end_matches('/').to_string(), guard));
        self
    }

    /// Guard for a path, or `None` for public views.
    pub fn guard_for(&self, path: &str) -> Option<&Guard> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        self.entries
            .iter()
            .filter(|(prefix, _)| {
                path == prefix.as_str()
                    || prefix.is_empty()
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, guard)| guard)
    }

    /// Evaluate navigation to `path`. Unguarded paths are allowed.
    pub fn check(&self, state: &AuthState, path: &str, routes: &Routes) -> Decision {
        match self.guard_for(path) {
            Some(guard) => evaluate(state, guard, path, routes),
            None => Decision::Allow,
        }
    }
}

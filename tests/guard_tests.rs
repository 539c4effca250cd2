// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard tests.
//!
//! These tests verify that:
//! 1. Signed-out visitors always go to sign-in, carrying where they were going
//! 2. Missing roles redirect to the right home view, never to a forbidden one
//! 3. Following a redirect never leads to another redirect

use bank_session::auth::{AuthState, Role};
use bank_session::guard::{evaluate, landing_path, Decision, Guard, Redirect, RouteTable, Routes};
use chrono::Utc;

mod common;
use common::{mint, now};

fn state(roles: &[&str]) -> AuthState {
    AuthState::from_token(Some(&mint("u1", roles, now() + 3600)), Utc::now(), 1)
}

fn redirect(path: &str) -> Decision {
    Decision::RedirectTo(Redirect {
        path: path.to_string(),
        return_to: None,
    })
}

#[test]
fn test_signed_out_always_redirects_to_sign_in() {
    let routes = Routes::default();
    let expired = AuthState::from_token(
        Some(&mint("u2", &["CUSTOMER"], now() - 10)),
        Utc::now(),
        1,
    );

    let guards = [
        Guard::signed_in(),
        Guard::role(Role::Customer),
        Guard::role(Role::Admin),
        Guard::role(Role::None),
        Guard::RequireAnyRole(vec![Role::Admin, Role::Employee]),
        Guard::KycOnly,
    ];

    for signed_out in [AuthState::unauthenticated(0), expired] {
        for guard in &guards {
            let decision = evaluate(&signed_out, guard, "/customer/transfers", &routes);
            assert_eq!(
                decision,
                Decision::RedirectTo(Redirect {
                    path: "/signin".to_string(),
                    return_to: Some("/customer/transfers".to_string()),
                }),
                "guard {:?}",
                guard
            );
        }
    }
}

#[test]
fn test_no_required_role_allows_any_session() {
    let routes = Routes::default();
    for roles in [&["NONE"][..], &["CUSTOMER"], &["ADMIN"], &[]] {
        assert!(evaluate(&state(roles), &Guard::signed_in(), "/profile", &routes).is_allowed());
    }
}

#[test]
fn test_kyc_pending_goes_to_kyc() {
    let routes = Routes::default();
    let decision = evaluate(
        &state(&["NONE"]),
        &Guard::role(Role::Customer),
        "/customer/dashboard",
        &routes,
    );
    assert_eq!(decision, redirect("/kyc"));
}

#[test]
fn test_customer_never_sent_to_admin_area() {
    let routes = Routes::default();
    let decision = evaluate(
        &state(&["CUSTOMER"]),
        &Guard::role(Role::Admin),
        "/admin/dashboard",
        &routes,
    );
    assert_eq!(decision, redirect("/customer/dashboard"));
}

#[test]
fn test_staff_missing_role_goes_to_admin_dashboard() {
    let routes = Routes::default();

    let employee = state(&["EMPLOYEE"]);
    assert_eq!(
        evaluate(&employee, &Guard::role(Role::Customer), "/customer/cards", &routes),
        redirect("/admin/dashboard")
    );
    assert_eq!(
        evaluate(&employee, &Guard::role(Role::Admin), "/admin/users", &routes),
        redirect("/admin/dashboard")
    );
    assert!(evaluate(
        &employee,
        &Guard::RequireAnyRole(vec![Role::Admin, Role::Employee]),
        "/admin/users",
        &routes
    )
    .is_allowed());
}

#[test]
fn test_has_role_beats_primary_role() {
    // Primary role is EMPLOYEE, but the customer area is still reachable.
    let routes = Routes::default();
    let decision = evaluate(
        &state(&["CUSTOMER", "EMPLOYEE"]),
        &Guard::role(Role::Customer),
        "/customer/dashboard",
        &routes,
    );
    assert!(decision.is_allowed());
}

#[test]
fn test_kyc_only_guard() {
    let routes = Routes::default();

    assert!(evaluate(&state(&["NONE"]), &Guard::KycOnly, "/kyc", &routes).is_allowed());
    assert_eq!(
        evaluate(&state(&["CUSTOMER"]), &Guard::KycOnly, "/kyc", &routes),
        redirect("/customer/dashboard")
    );
    assert_eq!(
        evaluate(&state(&["ADMIN"]), &Guard::KycOnly, "/kyc", &routes),
        redirect("/admin/dashboard")
    );
    assert!(evaluate(&state(&[]), &Guard::KycOnly, "/kyc", &routes).is_allowed());
}

#[test]
fn test_kyc_pending_scenario_navigation() {
    let routes = Routes::default();
    let table = RouteTable::banking(&routes);
    let pending = state(&["NONE"]);

    assert_eq!(
        table.check(&pending, "/customer/dashboard", &routes).redirect_path(),
        Some("/kyc")
    );
    assert!(table.check(&pending, "/kyc", &routes).is_allowed());
}

#[test]
fn test_redirect_targets_are_reachable() {
    let routes = Routes::default();
    let table = RouteTable::banking(&routes);
    let role_sets: [&[&str]; 8] = [
        &[],
        &["NONE"],
        &["CUSTOMER"],
        &["EMPLOYEE"],
        &["ADMIN"],
        &["CUSTOMER", "EMPLOYEE"],
        &["AUDITOR"],
        &["ADMIN", "NONE"],
    ];
    let paths = [
        "/kyc",
        "/customer/dashboard",
        "/customer/cards",
        "/admin/dashboard",
        "/admin/users",
        "/profile",
    ];

    for roles in role_sets {
        let session = state(roles);
        for path in paths {
            if let Some(target) = table.check(&session, path, &routes).redirect_path() {
                assert!(
                    table.check(&session, target, &routes).is_allowed(),
                    "roles {:?}: {} -> {} redirects again",
                    roles,
                    path,
                    target
                );
            }
        }
    }
}

#[test]
fn test_public_paths_are_allowed_signed_out() {
    let routes = Routes::default();
    let table = RouteTable::banking(&routes);
    let signed_out = AuthState::unauthenticated(0);

    assert!(table.check(&signed_out, "/", &routes).is_allowed());
    assert!(table.check(&signed_out, "/signin", &routes).is_allowed());
    assert_eq!(
        table
            .check(&signed_out, "/customer/dashboard", &routes)
            .redirect_path(),
        Some("/signin")
    );
}

#[test]
fn test_landing_path_after_sign_in() {
    let routes = Routes::default();
    let customer = state(&["CUSTOMER"]);

    assert_eq!(
        landing_path(&customer, Some("/customer/cards"), &routes),
        "/customer/cards"
    );
    assert_eq!(landing_path(&customer, None, &routes), "/customer/dashboard");
    assert_eq!(
        landing_path(&customer, Some("https://evil.example/"), &routes),
        "/customer/dashboard"
    );
    assert_eq!(
        landing_path(&customer, Some("//evil.example/"), &routes),
        "/customer/dashboard"
    );
    assert_eq!(
        landing_path(&customer, Some("/signin?redirect=%2Fkyc"), &routes),
        "/customer/dashboard"
    );
    assert_eq!(landing_path(&state(&["NONE"]), None, &routes), "/kyc");
    assert_eq!(
        landing_path(&state(&["EMPLOYEE"]), None, &routes),
        "/admin/dashboard"
    );
    assert_eq!(
        landing_path(&AuthState::unauthenticated(0), Some("/customer/cards"), &routes),
        "/signin"
    );
}

#[test]
fn test_custom_routes_are_used() {
    let routes = Routes {
        sign_in: "/login".to_string(),
        kyc: "/onboarding".to_string(),
        customer_dashboard: "/home".to_string(),
        admin_dashboard: "/staff".to_string(),
    };

    assert_eq!(
        evaluate(&state(&["NONE"]), &Guard::role(Role::Customer), "/home", &routes),
        redirect("/onboarding")
    );
    assert_eq!(
        evaluate(&AuthState::unauthenticated(0), &Guard::KycOnly, "/onboarding", &routes)
            .redirect_path(),
        Some("/login")
    );
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication: token claims, roles, and derived auth state.

pub mod claims;
pub mod role;
pub mod state;

pub use claims::{decode, Claims, DecodeError};
pub use role::Role;
pub use state::{live_claims, AuthState, AuthStateStore};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session error types with user-facing messages.

use crate::auth::claims::DecodeError;

/// Notice shown on the sign-in view after the backend rejected the session.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

/// Errors raised by the session core.
///
/// None of these are fatal: the worst outcome is a redirect to sign-in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session token: {0}")]
    Decode(#[from] DecodeError),

    #[error("Session token has expired")]
    Expired,

    #[error("Session rejected by the server")]
    AuthorizationRejection,

    #[error("Profile request failed: {0}")]
    TransientFetch(String),
}

impl SessionError {
    /// Message to show the user, if this error should be surfaced at all.
    ///
    /// Decode and expiry failures silently downgrade to "signed out".
    pub fn user_message(&self) -> Option<String> {
        match self {
            SessionError::Decode(_) | SessionError::Expired => None,
            SessionError::AuthorizationRejection => Some(SESSION_EXPIRED_NOTICE.to_string()),
            SessionError::TransientFetch(msg) => Some(msg.clone()),
        }
    }

    /// True if this error ends the session.
    pub fn ends_session(&self) -> bool {
        !matches!(self, SessionError::TransientFetch(_))
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

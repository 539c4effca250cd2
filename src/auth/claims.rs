// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token claims.
//!
//! Tokens are decoded WITHOUT signature verification. The client only reads
//! the payload to drive navigation; the backend still validates the token on
//! every API call and answers 401/403 when it is not acceptable.

use chrono::{DateTime, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried in the session token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Raw role strings, e.g. `["CUSTOMER"]`
    pub roles: Vec<String>,
    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_status: Option<String>,
}

impl Claims {
    /// True once `now` has reached the expiry. A token is live only while
    /// `exp > now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Exact, case-sensitive membership in the raw role set.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// "First Last" when the token carries a name, else the email or subject.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.email.clone().unwrap_or_else(|| self.sub.clone()),
        }
    }
}

/// Why a token could not be read as a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("token is empty")]
    Empty,

    #[error("token is not in header.payload.signature form")]
    Malformed,

    #[error("token segment is not valid base64url: {0}")]
    Encoding(String),

    #[error("token payload is invalid: {0}")]
    Payload(String),

    #[error("token is missing required claim: {0}")]
    MissingClaim(&'static str),
}

/// Decode a session token's payload into [`Claims`].
///
/// Signature, expiry and audience are not checked here; expiry is judged by
/// the caller against its own clock.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }
    if token.split('.').count() != 3 {
        return Err(DecodeError::Malformed);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(&[]);
    let data = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidToken => DecodeError::Malformed,
            ErrorKind::Base64(err) => DecodeError::Encoding(err.to_string()),
            ErrorKind::Utf8(err) => DecodeError::Encoding(err.to_string()),
            ErrorKind::Json(err) => DecodeError::Payload(err.to_string()),
            _ => DecodeError::Payload(e.to_string()),
        }
    })?;

    let claims = data.claims;
    if claims.sub.trim().is_empty() {
        return Err(DecodeError::MissingClaim("sub"));
    }

    Ok(claims)
}

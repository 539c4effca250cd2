// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Banking API client for the profile resource.
//!
//! Handles:
//! - Profile retrieval with bearer auth
//! - Classification of authorization failures (401/403) vs. everything else

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;

/// Profile record as returned by the server.
///
/// Fields the client does not model are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Envelope used by every API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Profile API failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Session rejected by server (HTTP {0})")]
    Unauthorized(u16),

    #[error("Server error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Could not reach the server: {0}")]
    Transport(String),

    #[error("{0}")]
    Unsuccessful(String),
}

impl ApiError {
    /// True if the server refused the session itself.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// Source of extended profile data.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn fetch_profile(&self, token: &str) -> Result<ProfileRecord, ApiError>;
}

#[async_trait]
impl<T: ProfileApi + ?Sized> ProfileApi for Arc<T> {
    async fn fetch_profile(&self, token: &str) -> Result<ProfileRecord, ApiError> {
        (**self).fetch_profile(token).await
    }
}

/// Profile API over HTTP.
#[derive(Clone)]
pub struct HttpProfileApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProfileApi {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("failed building profile HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn profile_url(&self) -> String {
        format!("{}/users/profile", self.base_url)
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn fetch_profile(&self, token: &str) -> Result<ProfileRecord, ApiError> {
        let response = self
            .http
            .get(self.profile_url())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            tracing::warn!(status = status.as_u16(), "Profile request rejected");
            return Err(ApiError::Unauthorized(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed reading profile response: {}", e)))?;
        let parsed = serde_json::from_str::<ApiResponse<ProfileRecord>>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope =
            parsed.map_err(|e| ApiError::Unsuccessful(format!("Invalid profile response: {}", e)))?;

        match envelope {
            ApiResponse {
                success: true,
                data: Some(profile),
                ..
            } => Ok(profile),
            ApiResponse { message, .. } => Err(ApiError::Unsuccessful(
                message.unwrap_or_else(|| "Failed to load profile".to_string()),
            )),
        }
    }
}

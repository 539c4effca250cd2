//! Client configuration loaded from environment variables.
//!
//! Route targets are stable contract strings the surrounding router must
//! register, so they are validated once at load time.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::guard::Routes;

/// Default storage key for the raw session token.
pub const DEFAULT_TOKEN_KEY: &str = "bank_session_token";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the banking REST API (no trailing slash)
    pub api_base_url: String,
    /// Directory holding persisted session values
    pub storage_dir: PathBuf,
    /// Storage key for the session token
    pub token_key: String,
    /// Redirect targets used by the route guards
    pub routes: Routes,
    /// Timeout for profile requests
    pub http_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            storage_dir: PathBuf::from(".bank-session"),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            routes: Routes::default(),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Routes::default();
        let routes = Routes {
            sign_in: route_var("BANK_SIGNIN_PATH", &defaults.sign_in)?,
            kyc: route_var("BANK_KYC_PATH", &defaults.kyc)?,
            customer_dashboard: route_var(
                "BANK_CUSTOMER_DASHBOARD_PATH",
                &defaults.customer_dashboard,
            )?,
            admin_dashboard: route_var("BANK_ADMIN_DASHBOARD_PATH", &defaults.admin_dashboard)?,
        };

        let http_timeout = match env::var("BANK_HTTP_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("BANK_HTTP_TIMEOUT_SECS", v))?,
            ),
            Err(_) => Duration::from_secs(10),
        };

        Ok(Self {
            api_base_url: env::var("BANK_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("BANK_API_URL"))?,
            storage_dir: env::var("BANK_SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".bank-session")),
            token_key: env::var("BANK_TOKEN_KEY").unwrap_or_else(|_| DEFAULT_TOKEN_KEY.to_string()),
            routes,
            http_timeout,
        })
    }
}

/// Read a route path, falling back to `default`. Paths must be local.
fn route_var(name: &'static str, default: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if v.starts_with('/') => Ok(v),
        Ok(v) => Err(ConfigError::Invalid(name, v)),
        Err(_) => Ok(default.to_string()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

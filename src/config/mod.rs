//! Endpoint and timing configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{AuthError, Result};

/// YoLink token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.yosmart.com/open/yolink/token";
/// YoLink open API endpoint used for the home identity probe.
pub const DEFAULT_API_URL: &str = "https://api.yosmart.com/open/yolink/v2/api";

const DEFAULT_EXCHANGE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 10_000;
/// Refresh the token 5 minutes before expiry.
const TOKEN_REFRESH_BUFFER_SECS: u64 = 300;
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Configuration shared by [`TokenManager`](crate::auth::TokenManager) and
/// [`IdentityVerifier`](crate::identity::IdentityVerifier).
///
/// Every field has a default, so a partial TOML table is enough:
///
/// ```
/// use yolink_uac::config::AuthConfig;
///
/// let config = AuthConfig::from_toml_str("exchange_timeout_ms = 5000").unwrap();
/// assert_eq!(config.exchange_timeout().as_secs(), 5);
/// assert_eq!(config.refresh_buffer_secs, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_url: String,
    pub api_url: String,
    /// Bound on each individual grant exchange attempt.
    pub exchange_timeout_ms: u64,
    /// Bound on each network step of the identity probe.
    pub verification_timeout_ms: u64,
    pub refresh_buffer_secs: u64,
    /// Token lifetime assumed when the endpoint omits `expires_in`.
    pub default_expires_in_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            exchange_timeout_ms: DEFAULT_EXCHANGE_TIMEOUT_MS,
            verification_timeout_ms: DEFAULT_VERIFICATION_TIMEOUT_MS,
            refresh_buffer_secs: TOKEN_REFRESH_BUFFER_SECS,
            default_expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
        }
    }
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML table, filling unset fields with defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout_ms = duration_millis(timeout);
        self
    }

    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout_ms = duration_millis(timeout);
        self
    }

    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer_secs = buffer.as_secs();
        self
    }

    pub fn with_default_expires_in(mut self, secs: u64) -> Self {
        self.default_expires_in_secs = secs;
        self
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_millis(self.exchange_timeout_ms)
    }

    pub fn verification_timeout(&self) -> Duration {
        Duration::from_millis(self.verification_timeout_ms)
    }

    pub fn refresh_buffer(&self) -> chrono::Duration {
        let secs = i64::try_from(self.refresh_buffer_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }

    /// Reject configurations that could never produce a usable token.
    pub fn validate(&self) -> Result<()> {
        if self.token_url.trim().is_empty() {
            return Err(AuthError::Configuration("token_url is empty".to_string()));
        }
        if self.api_url.trim().is_empty() {
            return Err(AuthError::Configuration("api_url is empty".to_string()));
        }
        if self.exchange_timeout_ms == 0 {
            return Err(AuthError::Configuration(
                "exchange_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.verification_timeout_ms == 0 {
            return Err(AuthError::Configuration(
                "verification_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

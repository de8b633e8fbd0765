//! Error types for yolink-uac.

use std::time::Duration;

use thiserror::Error;

/// Primary error type for token lifecycle and identity verification.
///
/// Errors are `Clone` so the outcome of one shared token exchange can be
/// handed to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The grant exchange was attempted and rejected, failed in transit, or
    /// timed out, with the refresh fallback already exhausted.
    #[error("Token exchange failed: {message}")]
    ExchangeFailed { message: String, timed_out: bool },

    #[error("No access token available")]
    NoTokenAvailable,

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Identity mismatch: expected {expected}, got {actual}")]
    IdentityMismatch { expected: String, actual: String },

    #[error("Verification timed out after {0}ms")]
    VerificationTimeout(u64),

    #[error("API error (code {code}): {message}")]
    Api { code: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Create an exchange failure that was not caused by a timeout.
    pub fn exchange(message: impl Into<String>) -> Self {
        Self::ExchangeFailed {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Create an exchange failure for an attempt that exceeded its time bound.
    pub fn exchange_timeout(elapsed: Duration) -> Self {
        Self::ExchangeFailed {
            message: format!("timed out after {}ms", elapsed.as_millis()),
            timed_out: true,
        }
    }

    /// Whether this error was caused by an exceeded time bound.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ExchangeFailed { timed_out: true, .. } | Self::VerificationTimeout(_)
        )
    }

    /// Stable machine-readable reason, suitable for mapping onto user-facing
    /// messages in a setup form.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::VerificationTimeout(_) => "timeout_connect",
            Self::ExchangeFailed { timed_out: true, .. } => "timeout_connect",
            Self::InvalidIdentity(_) => "invalid_home",
            Self::IdentityMismatch { .. } => "wrong_home",
            Self::NoTokenAvailable => "no_token",
            Self::Configuration(_) => "invalid_config",
            Self::ExchangeFailed { .. }
            | Self::Api { .. }
            | Self::Network(_)
            | Self::InvalidResponse(_) => "cannot_connect",
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AuthError>;

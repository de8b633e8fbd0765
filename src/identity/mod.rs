//! Account identity verification for setup and re-authentication.

pub mod source;
pub mod verifier;

pub use source::{HttpIdentitySource, IdentitySource};
pub use verifier::IdentityVerifier;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Display name used when the remote omits one.
pub const DEFAULT_DISPLAY_NAME: &str = "YoLink Home";

const UNIQUE_ID_PREFIX: &str = "yolink_multi";

/// Identity payload as returned by the remote, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl IdentityInfo {
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.map(String::from),
        }
    }
}

/// A validated account identity. `id` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub id: String,
    pub display_name: String,
}

impl AccountIdentity {
    /// Key under which a caller registers this account.
    pub fn unique_id(&self) -> String {
        format!("{UNIQUE_ID_PREFIX}_{}", self.id)
    }
}

impl TryFrom<IdentityInfo> for AccountIdentity {
    type Error = AuthError;

    fn try_from(info: IdentityInfo) -> Result<Self> {
        let id = info
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AuthError::InvalidIdentity("no home id returned from API".to_string())
            })?;
        let display_name = info
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
        Ok(Self { id, display_name })
    }
}

/// Result of first-time setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    New(AccountIdentity),
    /// The caller already has an account registered under this identity.
    AlreadyConfigured(AccountIdentity),
}

impl SetupOutcome {
    pub fn identity(&self) -> &AccountIdentity {
        match self {
            Self::New(identity) | Self::AlreadyConfigured(identity) => identity,
        }
    }
}

//! Convenience re-exports.

pub use crate::auth::{
    AuthEvent, AuthEventKind, AuthEventSink, Credential, GrantType, TokenManager, TokenStatus,
};
pub use crate::config::AuthConfig;
pub use crate::error::{AuthError, Result};
pub use crate::identity::{
    AccountIdentity, HttpIdentitySource, IdentitySource, IdentityVerifier, SetupOutcome,
};

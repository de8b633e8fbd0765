//! UAC credentials, token exchange and token lifecycle.

pub mod credential;
pub mod events;
mod exchange;
pub mod manager;
pub mod token;

pub use credential::Credential;
pub use events::{AuthEvent, AuthEventKind, AuthEventSink};
pub use manager::TokenManager;
pub use token::{GrantResult, GrantType, TokenState, TokenStatus};

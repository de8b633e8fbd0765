//! Structured events emitted while a manager exchanges tokens.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::token::GrantType;

/// Callback receiving every [`AuthEvent`] a manager emits.
pub type AuthEventSink = Arc<dyn Fn(AuthEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: AuthEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEventKind {
    ExchangeStarted {
        grant: GrantType,
    },
    ExchangeSucceeded {
        grant: GrantType,
        expires_at: DateTime<Utc>,
        refresh_token_issued: bool,
    },
    ExchangeFailed {
        grant: GrantType,
        reason: String,
    },
    /// The refresh token was discarded and a client-credentials exchange follows.
    FallingBack,
    /// A caller attached to an exchange already in flight instead of starting one.
    JoinedPendingExchange,
}

#[derive(Clone, Default)]
pub(crate) struct EventEmitter {
    sink: Option<AuthEventSink>,
}

impl EventEmitter {
    pub(crate) fn new(sink: Option<AuthEventSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn emit(&self, kind: AuthEventKind) {
        let Some(sink) = &self.sink else {
            return;
        };
        (sink)(AuthEvent {
            timestamp: Utc::now(),
            kind,
        });
    }
}

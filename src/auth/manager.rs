//! Token lifecycle manager.
//!
//! Tracks token validity for one account, refreshes lazily before expiry and
//! guarantees at most one grant exchange in flight per manager.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::credential::Credential;
use super::events::{AuthEventKind, AuthEventSink, EventEmitter};
use super::exchange::{GrantRequest, TokenEndpoint};
use super::token::{expiry_after, TokenState, TokenStatus};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

type PendingExchange = Shared<BoxFuture<'static, Result<String>>>;

#[derive(Default)]
struct SharedState {
    tokens: Mutex<TokenState>,
    /// Held for the whole refresh-then-fallback sequence.
    exchange_lock: tokio::sync::Mutex<()>,
    /// Refresh started by `ensure_valid_token` that late callers join.
    pending: Mutex<Option<PendingExchange>>,
}

/// Keeps a YoLink access token valid for the lifetime of a connection.
///
/// Cloning is cheap; clones share token state and the in-flight exchange, so
/// one manager can serve every concurrent request for an account.
///
/// # Example
/// ```no_run
/// use yolink_uac::auth::{Credential, TokenManager};
/// use yolink_uac::config::AuthConfig;
///
/// # async fn example() -> yolink_uac::error::Result<()> {
/// let manager = TokenManager::new(Credential::new("uaid", "secret"), &AuthConfig::default());
/// let token = manager.ensure_valid_token().await?;
/// println!("Bearer {token}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TokenManager {
    credential: Arc<Credential>,
    endpoint: TokenEndpoint,
    refresh_buffer: chrono::Duration,
    events: EventEmitter,
    shared: Arc<SharedState>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .field("refresh_buffer", &self.refresh_buffer)
            .field("tokens", &*self.lock_tokens())
            .finish()
    }
}

impl TokenManager {
    /// Build a manager from `config` as given. Use [`TokenManager::try_new`]
    /// for configs that did not come from [`AuthConfig::from_toml_str`].
    pub fn new(credential: Credential, config: &AuthConfig) -> Self {
        Self {
            credential: Arc::new(credential),
            endpoint: TokenEndpoint::new(reqwest::Client::new(), config),
            refresh_buffer: config.refresh_buffer(),
            events: EventEmitter::default(),
            shared: Arc::new(SharedState::default()),
        }
    }

    /// Like [`TokenManager::new`], but rejects an invalid config first.
    pub fn try_new(credential: Credential, config: &AuthConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(credential, config))
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.endpoint = self.endpoint.with_client(client);
        self
    }

    pub fn with_event_sink(mut self, sink: AuthEventSink) -> Self {
        self.events = EventEmitter::new(Some(sink));
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Perform a grant exchange now, regardless of expiry.
    ///
    /// With `prefer_refresh` and a stored refresh token, tries the
    /// `refresh_token` grant first; if that fails the refresh token is
    /// discarded and one `client_credentials` exchange follows. A failed
    /// exchange leaves any previously issued access token in place.
    pub async fn acquire_token(&self, prefer_refresh: bool) -> Result<String> {
        let _exchange = self.shared.exchange_lock.lock().await;
        self.exchange(prefer_refresh).await
    }

    /// The stored access token, without any network call.
    pub fn current_token(&self) -> Result<String> {
        self.lock_tokens()
            .access_token
            .clone()
            .ok_or(AuthError::NoTokenAvailable)
    }

    /// Return a token that is outside the refresh buffer, refreshing first if
    /// needed.
    ///
    /// Concurrent callers that find a refresh already running await that
    /// exchange and receive its outcome.
    pub async fn ensure_valid_token(&self) -> Result<String> {
        if !self.needs_refresh() {
            return self.current_token();
        }
        let pending = {
            let mut slot = self.lock_pending();
            match slot.clone() {
                Some(pending) => {
                    self.events.emit(AuthEventKind::JoinedPendingExchange);
                    pending
                }
                // A refresh finished between the first check and taking the slot.
                None if !self.needs_refresh() => {
                    drop(slot);
                    return self.current_token();
                }
                None => {
                    let pending = self.spawn_refresh();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    pub fn status(&self) -> TokenStatus {
        self.lock_tokens().status(Utc::now(), self.refresh_buffer)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lock_tokens().expires_at
    }

    pub fn has_refresh_token(&self) -> bool {
        self.lock_tokens().refresh_token.is_some()
    }

    /// Run the refresh on its own task so that a caller dropping its future
    /// does not cancel the exchange for the other waiters.
    fn spawn_refresh(&self) -> PendingExchange {
        let manager = self.clone();
        let task = tokio::spawn(async move {
            let result = manager.refresh_if_needed().await;
            manager.lock_pending().take();
            result
        });
        async move {
            task.await.unwrap_or_else(|err| {
                Err(AuthError::exchange(format!("refresh task failed: {err}")))
            })
        }
        .boxed()
        .shared()
    }

    async fn refresh_if_needed(&self) -> Result<String> {
        let _exchange = self.shared.exchange_lock.lock().await;
        // A direct acquire_token may have run while we waited for the lock.
        if !self.needs_refresh() {
            return self.current_token();
        }
        self.exchange(true).await
    }

    async fn exchange(&self, prefer_refresh: bool) -> Result<String> {
        let refresh_token = if prefer_refresh {
            self.lock_tokens().refresh_token.clone()
        } else {
            None
        };
        let Some(refresh_token) = refresh_token else {
            return self
                .attempt(GrantRequest::client_credentials(&self.credential))
                .await;
        };

        match self
            .attempt(GrantRequest::refresh(&self.credential, &refresh_token))
            .await
        {
            Ok(token) => Ok(token),
            Err(err) => {
                // Discarded even when the failure was transient.
                info!(error = %err, "refresh token failed, trying client_credentials");
                self.lock_tokens().refresh_token = None;
                self.events.emit(AuthEventKind::FallingBack);
                self.attempt(GrantRequest::client_credentials(&self.credential))
                    .await
            }
        }
    }

    async fn attempt(&self, request: GrantRequest<'_>) -> Result<String> {
        let grant = request.grant_type();
        debug!(%grant, "requesting access token");
        self.events.emit(AuthEventKind::ExchangeStarted { grant });

        match self.endpoint.exchange(&request).await {
            Ok(result) => {
                let now = Utc::now();
                let expires_at = expiry_after(now, result.expires_in);
                let refresh_token_issued = result.refresh_token.is_some();
                let access_token = result.access_token.clone();
                *self.lock_tokens() = TokenState::from_grant(result, now);

                debug!(%grant, %expires_at, "access token obtained");
                self.events.emit(AuthEventKind::ExchangeSucceeded {
                    grant,
                    expires_at,
                    refresh_token_issued,
                });
                Ok(access_token)
            }
            Err(err) => {
                warn!(%grant, error = %err, "failed to obtain access token");
                self.events.emit(AuthEventKind::ExchangeFailed {
                    grant,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn needs_refresh(&self) -> bool {
        self.lock_tokens().needs_refresh(Utc::now(), self.refresh_buffer)
    }

    fn lock_tokens(&self) -> MutexGuard<'_, TokenState> {
        self.shared
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingExchange>> {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

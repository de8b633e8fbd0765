use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{AccountIdentity, IdentitySource, SetupOutcome};
use crate::auth::{AuthEventSink, Credential, TokenManager};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::util::timeout::with_timeout;

/// Validates entered credentials and resolves the account they belong to.
///
/// Every call builds its own temporary [`TokenManager`]; the manager used for
/// regular traffic afterwards is a separate instance.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use yolink_uac::auth::Credential;
/// use yolink_uac::identity::{HttpIdentitySource, IdentityVerifier};
///
/// # async fn example() -> yolink_uac::error::Result<()> {
/// let verifier = IdentityVerifier::new(Arc::new(HttpIdentitySource::new()));
/// let identity = verifier.verify(&Credential::new("uaid", "secret"), None).await?;
/// println!("{} ({})", identity.display_name, identity.id);
/// # Ok(())
/// # }
/// ```
pub struct IdentityVerifier {
    source: Arc<dyn IdentitySource>,
    config: AuthConfig,
    client: reqwest::Client,
    event_sink: Option<AuthEventSink>,
}

impl IdentityVerifier {
    pub fn new(source: Arc<dyn IdentitySource>) -> Self {
        Self {
            source,
            config: AuthConfig::default(),
            client: reqwest::Client::new(),
            event_sink: None,
        }
    }

    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Forward token events from the temporary manager.
    pub fn with_event_sink(mut self, sink: AuthEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Prove `credential` works and return the identity it belongs to.
    ///
    /// With `existing_identity_id` (re-authentication), the returned identity
    /// must match it. Probe resources are released on every path, including
    /// when the returned future is dropped before completion.
    pub async fn verify(
        &self,
        credential: &Credential,
        existing_identity_id: Option<&str>,
    ) -> Result<AccountIdentity> {
        self.config.validate()?;

        let release = ReleaseGuard::new(self.source.clone());
        let mut manager = TokenManager::new(credential.clone(), &self.config)
            .with_client(self.client.clone());
        if let Some(sink) = &self.event_sink {
            manager = manager.with_event_sink(sink.clone());
        }

        let result = self.probe(&manager, existing_identity_id).await;
        release.release().await;
        drop(manager);

        if let Err(err) = &result {
            warn!(error = %err, reason = err.reason_code(), "identity verification failed");
        }
        result
    }

    /// First-time setup: verify, then classify against the ids the caller
    /// already has registered.
    pub async fn setup(
        &self,
        credential: &Credential,
        known_ids: &[String],
    ) -> Result<SetupOutcome> {
        let identity = self.verify(credential, None).await?;
        if known_ids.iter().any(|known| *known == identity.id) {
            debug!(home_id = %identity.id, "home already configured");
            return Ok(SetupOutcome::AlreadyConfigured(identity));
        }
        Ok(SetupOutcome::New(identity))
    }

    /// Re-authentication must prove control of the same account.
    pub async fn reauthenticate(
        &self,
        credential: &Credential,
        existing_identity_id: &str,
    ) -> Result<AccountIdentity> {
        self.verify(credential, Some(existing_identity_id)).await
    }

    async fn probe(
        &self,
        manager: &TokenManager,
        existing_identity_id: Option<&str>,
    ) -> Result<AccountIdentity> {
        // Always a fresh client-credentials exchange.
        let token = manager
            .acquire_token(false)
            .await
            .map_err(|err| match err {
                AuthError::ExchangeFailed { timed_out: true, .. } => {
                    verification_timeout(self.config.exchange_timeout())
                }
                other => other,
            })?;

        let info = with_timeout(
            self.config.verification_timeout(),
            self.source.fetch_identity(&token),
            verification_timeout,
        )
        .await?;

        let identity = AccountIdentity::try_from(info)?;
        if let Some(expected) = existing_identity_id {
            if expected != identity.id {
                return Err(AuthError::IdentityMismatch {
                    expected: expected.to_string(),
                    actual: identity.id,
                });
            }
        }
        debug!(home_id = %identity.id, "identity verified");
        Ok(identity)
    }
}

/// Releases the identity source once, on the normal path or on drop.
struct ReleaseGuard {
    source: Option<Arc<dyn IdentitySource>>,
}

impl ReleaseGuard {
    fn new(source: Arc<dyn IdentitySource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    async fn release(mut self) {
        if let Some(source) = self.source.take() {
            source.release().await;
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let Some(source) = self.source.take() else {
            return;
        };
        // Dropped mid-probe: finish the release on the runtime.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("identity verification abandoned, releasing probe");
                handle.spawn(async move { source.release().await });
            }
            Err(_) => warn!("identity verification dropped outside a runtime, release skipped"),
        }
    }
}

fn verification_timeout(elapsed: Duration) -> AuthError {
    AuthError::VerificationTimeout(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

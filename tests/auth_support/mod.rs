#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yolink_uac::auth::{AuthEvent, AuthEventKind, AuthEventSink, Credential, TokenManager};
use yolink_uac::config::AuthConfig;
use yolink_uac::error::AuthError;
use yolink_uac::identity::{IdentityInfo, IdentitySource};

pub const TOKEN_PATH: &str = "/open/yolink/token";
pub const API_PATH: &str = "/open/yolink/v2/api";

pub fn credential() -> Credential {
    Credential::new("uaid-1", "secret-1")
}

pub fn config(server: &MockServer) -> AuthConfig {
    AuthConfig::default()
        .with_token_url(format!("{}{TOKEN_PATH}", server.uri()))
        .with_api_url(format!("{}{API_PATH}", server.uri()))
}

pub fn manager(server: &MockServer) -> TokenManager {
    TokenManager::new(credential(), &config(server))
}

pub fn token_body(access: &str, refresh: Option<&str>, expires_in: Option<u64>) -> Value {
    let mut body = json!({ "access_token": access });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    if let Some(expires_in) = expires_in {
        body["expires_in"] = json!(expires_in);
    }
    body
}

/// Mock matching token requests for one grant type.
pub fn grant(grant_type: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_partial_json(json!({ "grant_type": grant_type })))
}

pub fn token_ok(access: &str, refresh: Option<&str>, expires_in: Option<u64>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(token_body(access, refresh, expires_in))
}

pub fn token_rejected(status: u16) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "error": "invalid_grant" }))
}

pub async fn mount_initial_token(
    server: &MockServer,
    access: &str,
    refresh: Option<&str>,
    expires_in: u64,
) {
    grant("client_credentials")
        .respond_with(token_ok(access, refresh, Some(expires_in)))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(server)
        .await;
}

/// Collects every event a manager emits.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<AuthEvent>>>,
}

impl EventLog {
    pub fn sink(&self) -> AuthEventSink {
        let events = self.events.clone();
        Arc::new(move |event: AuthEvent| events.lock().expect("event log poisoned").push(event))
    }

    pub fn kinds(&self) -> Vec<AuthEventKind> {
        self.events
            .lock()
            .expect("event log poisoned")
            .iter()
            .map(|event| event.kind.clone())
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&AuthEventKind) -> bool) -> usize {
        self.kinds().iter().filter(|kind| predicate(kind)).count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event log poisoned").clear();
    }
}

/// Identity source with a canned answer that records how it was used.
pub struct FakeIdentitySource {
    response: Result<IdentityInfo, AuthError>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
    releases: AtomicUsize,
    last_token: Mutex<Option<String>>,
}

impl FakeIdentitySource {
    pub fn returning(id: &str, name: Option<&str>) -> Self {
        Self::with_response(Ok(IdentityInfo::new(id, name)))
    }

    pub fn with_response(response: Result<IdentityInfo, AuthError>) -> Self {
        Self {
            response,
            delay: None,
            fetches: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            last_token: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().expect("token lock poisoned").clone()
    }
}

#[async_trait]
impl IdentitySource for FakeIdentitySource {
    async fn fetch_identity(&self, access_token: &str) -> Result<IdentityInfo, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_token.lock().expect("token lock poisoned") = Some(access_token.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

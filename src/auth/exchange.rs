//! Token endpoint client: one bounded grant exchange per call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::credential::Credential;
use super::token::{GrantResult, GrantType};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::util::timeout::with_timeout;

/// JSON body posted to the token endpoint.
#[derive(Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub(crate) enum GrantRequest<'a> {
    ClientCredentials {
        client_id: &'a str,
        client_secret: &'a str,
    },
    RefreshToken {
        client_id: &'a str,
        refresh_token: &'a str,
    },
}

impl<'a> GrantRequest<'a> {
    pub(crate) fn client_credentials(credential: &'a Credential) -> Self {
        Self::ClientCredentials {
            client_id: credential.client_id(),
            client_secret: credential.client_secret(),
        }
    }

    pub(crate) fn refresh(credential: &'a Credential, refresh_token: &'a str) -> Self {
        Self::RefreshToken {
            client_id: credential.client_id(),
            refresh_token,
        }
    }

    pub(crate) fn grant_type(&self) -> GrantType {
        match self {
            Self::ClientCredentials { .. } => GrantType::ClientCredentials,
            Self::RefreshToken { .. } => GrantType::RefreshToken,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TokenEndpoint {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    default_expires_in: u64,
}

impl TokenEndpoint {
    pub(crate) fn new(client: reqwest::Client, config: &AuthConfig) -> Self {
        Self {
            client,
            url: config.token_url.clone(),
            timeout: config.exchange_timeout(),
            default_expires_in: config.default_expires_in_secs,
        }
    }

    pub(crate) fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Perform a single exchange attempt, bounded by the exchange timeout.
    pub(crate) async fn exchange(&self, request: &GrantRequest<'_>) -> Result<GrantResult> {
        with_timeout(self.timeout, self.send(request), AuthError::exchange_timeout).await
    }

    async fn send(&self, request: &GrantRequest<'_>) -> Result<GrantResult> {
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|err| AuthError::exchange(format!("token request failed: {err}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::exchange(match extract_error_code(&body) {
                Some(code) => format!("token endpoint returned status {status}: {code}"),
                None => format!("token endpoint returned status {status}"),
            }));
        }
        let payload: TokenResponse = resp
            .json()
            .await
            .map_err(|err| AuthError::exchange(format!("malformed token response: {err}")))?;
        if payload.access_token.trim().is_empty() {
            return Err(AuthError::exchange("token response has an empty access_token"));
        }
        Ok(GrantResult {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token.filter(|token| !token.is_empty()),
            expires_in: payload.expires_in.unwrap_or(self.default_expires_in),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

fn extract_error_code(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    ["error", "msg", "desc"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::IdentityInfo;
use crate::config::{AuthConfig, DEFAULT_API_URL};
use crate::error::{AuthError, Result};

/// Transport used to ask the remote system who a token belongs to.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn fetch_identity(&self, access_token: &str) -> Result<IdentityInfo>;

    /// Release anything opened for a probe. Called once after every
    /// verification, whether it succeeded or not.
    async fn release(&self) {}
}

const HOME_INFO_METHOD: &str = "Home.getGeneralInfo";
const SUCCESS_CODE: &str = "000000";

/// Reads the home bound to a UAC through the YoLink open API.
///
/// # Example
/// ```no_run
/// use yolink_uac::identity::{HttpIdentitySource, IdentitySource};
///
/// # async fn example() -> yolink_uac::error::Result<()> {
/// let source = HttpIdentitySource::new();
/// let info = source.fetch_identity("access-token").await?;
/// println!("{:?}", info.id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpIdentitySource {
    client: reqwest::Client,
    api_url: String,
}

impl Default for HttpIdentitySource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpIdentitySource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new().with_api_url(config.api_url.clone())
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl IdentitySource for HttpIdentitySource {
    async fn fetch_identity(&self, access_token: &str) -> Result<IdentityInfo> {
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(access_token)
            .json(&ApiRequest {
                method: HOME_INFO_METHOD,
                time: Utc::now().timestamp_millis(),
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Api {
                code: status.as_u16().to_string(),
                message: format!("home info request failed with status {status}"),
            });
        }
        let envelope: ApiResponse = serde_json::from_slice(&resp.bytes().await?)?;
        if envelope.code != SUCCESS_CODE {
            return Err(AuthError::Api {
                code: envelope.code,
                message: envelope.desc.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        debug!("home info received");
        Ok(envelope.data.unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest {
    method: &'static str,
    time: i64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: String,
    desc: Option<String>,
    data: Option<IdentityInfo>,
}

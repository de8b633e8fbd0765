use std::fmt;

/// YoLink User Access Credentials: the UAID (client id) and its secret key.
///
/// Each UAC is tied to exactly one YoLink home.
///
/// # Example
/// ```
/// use yolink_uac::auth::Credential;
///
/// let credential = Credential::new("uaid-123", "secret");
/// assert_eq!(credential.client_id(), "uaid-123");
/// assert!(!format!("{credential:?}").contains("secret"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    client_id: String,
    client_secret: String,
}

impl Credential {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"..")
            .finish()
    }
}

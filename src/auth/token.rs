use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// OAuth grant used for a token exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantType {
    ClientCredentials,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful grant exchange, before it is folded into
/// [`TokenState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantResult {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

/// Where a manager's token sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No exchange has ever succeeded.
    Empty,
    Valid,
    /// Within the refresh buffer of (or past) expiry.
    ExpiringSoon,
}

/// Token material owned by a single manager.
///
/// Only a successful exchange replaces it, and always as a whole.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &self.access_token.as_ref().map(|_| ".."))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| ".."))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TokenState {
    /// Build the replacement state for a completed exchange.
    ///
    /// A grant without a refresh token clears the previous one.
    pub fn from_grant(grant: GrantResult, now: DateTime<Utc>) -> Self {
        Self {
            expires_at: Some(expiry_after(now, grant.expires_in)),
            access_token: Some(grant.access_token),
            refresh_token: grant.refresh_token,
        }
    }

    /// Whether the next `ensure_valid_token` must exchange first.
    ///
    /// The buffer boundary is inclusive.
    pub fn needs_refresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        match (&self.access_token, self.expires_at) {
            (Some(_), Some(expires_at)) => match expires_at.checked_sub_signed(buffer) {
                Some(refresh_at) => now >= refresh_at,
                None => true,
            },
            _ => true,
        }
    }

    pub fn status(&self, now: DateTime<Utc>, buffer: Duration) -> TokenStatus {
        if self.access_token.is_none() {
            TokenStatus::Empty
        } else if self.needs_refresh(now, buffer) {
            TokenStatus::ExpiringSoon
        } else {
            TokenStatus::Valid
        }
    }
}

/// Absolute expiry for a lifetime of `expires_in` seconds, saturating at the
/// maximum representable instant.
pub(crate) fn expiry_after(now: DateTime<Utc>, expires_in: u64) -> DateTime<Utc> {
    let secs = i64::try_from(expires_in).unwrap_or(i64::MAX);
    Duration::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn grant(refresh: Option<&str>, expires_in: u64) -> GrantResult {
        GrantResult {
            access_token: "access".to_string(),
            refresh_token: refresh.map(String::from),
            expires_in,
        }
    }

    #[test]
    fn empty_state_needs_refresh() {
        let state = TokenState::default();
        assert!(state.needs_refresh(at(0), Duration::seconds(300)));
        assert_eq!(state.status(at(0), Duration::seconds(300)), TokenStatus::Empty);
    }

    #[test]
    fn from_grant_computes_expiry_from_now() {
        let state = TokenState::from_grant(grant(Some("refresh"), 3600), at(0));
        assert_eq!(state.expires_at, Some(at(3600)));
        assert_eq!(state.access_token.as_deref(), Some("access"));
        assert_eq!(state.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn grant_without_refresh_token_clears_it() {
        let state = TokenState::from_grant(grant(None, 3600), at(0));
        assert!(state.refresh_token.is_none());
    }

    #[test]
    fn buffer_boundary_is_inclusive() {
        let buffer = Duration::seconds(300);
        let state = TokenState::from_grant(grant(None, 3600), at(0));
        assert!(!state.needs_refresh(at(3299), buffer));
        assert!(state.needs_refresh(at(3300), buffer));
        assert!(state.needs_refresh(at(4000), buffer));
    }

    #[test]
    fn status_tracks_clock() {
        let buffer = Duration::seconds(300);
        let state = TokenState::from_grant(grant(None, 600), at(0));
        assert_eq!(state.status(at(0), buffer), TokenStatus::Valid);
        assert_eq!(state.status(at(300), buffer), TokenStatus::ExpiringSoon);
    }

    #[test]
    fn huge_expires_in_saturates() {
        let state = TokenState::from_grant(grant(None, u64::MAX), at(0));
        assert_eq!(state.expires_at, Some(DateTime::<Utc>::MAX_UTC));
        assert!(!state.needs_refresh(at(0), Duration::seconds(300)));
    }

    #[test]
    fn debug_output_hides_tokens() {
        let state = TokenState::from_grant(grant(Some("secret-refresh"), 60), at(0));
        let rendered = format!("{state:?}");
        assert!(!rendered.contains("secret-refresh"));
        assert!(!rendered.contains("access\""));
    }
}

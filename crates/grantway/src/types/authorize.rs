//! Authorization code data.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::client::Client;

/// PKCE code challenge transformation (RFC 7636).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// Verifier compared to the challenge as-is.
    #[default]
    #[serde(rename = "plain")]
    Plain,
    /// Challenge is `BASE64URL(SHA256(verifier))`.
    #[serde(rename = "S256")]
    S256,
}

impl CodeChallengeMethod {
    /// Returns the wire `code_challenge_method` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }

    /// Parses a wire `code_challenge_method` value. An empty value selects
    /// the default `plain` transformation.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "" | "plain" => Some(Self::Plain),
            "S256" => Some(Self::S256),
            _ => None,
        }
    }
}

/// State persisted between a successful authorization response and the
/// redemption of its code at the token endpoint.
///
/// Consumed exactly once: the token endpoint deletes it after a successful
/// authorization_code grant. Expiration is always derived from
/// `created_at + expires_in`, never stored as a flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeData {
    /// Snapshot of the client the code was issued to. Must equal the
    /// authenticating client at redemption time.
    pub client: Client,

    /// The authorization code itself.
    pub code: String,

    /// Issuance time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Lifetime of the code.
    #[serde(with = "humantime_serde")]
    pub expires_in: Duration,

    /// Scope granted by the resource owner. Opaque to the engine.
    pub scope: String,

    /// Redirect URI the authorization response was delivered to. The token
    /// request must present the same URI.
    pub redirect_uri: String,

    /// Opaque client state echoed back on the redirect.
    pub state: String,

    /// Opaque data attached by the host at consent time.
    #[serde(default)]
    pub user_data: serde_json::Value,

    /// PKCE challenge, when the authorization request carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE transformation for `code_challenge`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<CodeChallengeMethod>,
}

impl AuthorizeData {
    /// Returns the instant the code stops being redeemable.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.created_at + self.expires_in
    }

    /// Returns `true` if the code is expired at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at() <= now
    }

    /// Returns `true` if the code is expired now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(created_at: OffsetDateTime) -> AuthorizeData {
        AuthorizeData {
            client: Client::public("app", "http://localhost/cb"),
            code: "abc123".into(),
            created_at,
            expires_in: Duration::from_secs(250),
            scope: String::new(),
            redirect_uri: "http://localhost/cb".into(),
            state: "xyz".into(),
            user_data: serde_json::Value::Null,
            code_challenge: None,
            code_challenge_method: None,
        }
    }

    #[test]
    fn test_expiration_boundary() {
        let t0 = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let data = sample(t0);
        assert!(!data.is_expired_at(t0 + Duration::from_secs(249)));
        assert!(data.is_expired_at(t0 + Duration::from_secs(250)));
        assert!(data.is_expired_at(t0 + Duration::from_secs(251)));
        assert_eq!(data.expires_at(), t0 + Duration::from_secs(250));
    }

    #[test]
    fn test_challenge_method_wire() {
        assert_eq!(
            CodeChallengeMethod::from_wire(""),
            Some(CodeChallengeMethod::Plain)
        );
        assert_eq!(
            CodeChallengeMethod::from_wire("plain"),
            Some(CodeChallengeMethod::Plain)
        );
        assert_eq!(
            CodeChallengeMethod::from_wire("S256"),
            Some(CodeChallengeMethod::S256)
        );
        assert_eq!(CodeChallengeMethod::from_wire("s256"), None);
        assert_eq!(CodeChallengeMethod::from_wire("S512"), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let t0 = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let mut data = sample(t0);
        data.code_challenge = Some("a".repeat(43));
        data.code_challenge_method = Some(CodeChallengeMethod::S256);

        let json = serde_json::to_string(&data).unwrap();
        let back: AuthorizeData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, data.code);
        assert_eq!(back.created_at, data.created_at);
        assert_eq!(back.expires_in, data.expires_in);
        assert_eq!(back.code_challenge_method, Some(CodeChallengeMethod::S256));
    }
}

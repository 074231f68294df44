//! Access and refresh token data.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::authorize::AuthorizeData;
use crate::types::client::Client;

/// State persisted for every issued access token.
///
/// Back-references to the originating authorization code and to the prior
/// token in a refresh chain are value snapshots taken at issuance time,
/// with their own back-references cleared so chains stay shallow and
/// non-cyclic. They are never live references into storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessData {
    /// Snapshot of the client the token was issued to. Must equal the
    /// authenticating client on refresh.
    pub client: Client,

    /// The authorization code data this token originated from, if issued
    /// through the authorization_code grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize_data: Option<Box<AuthorizeData>>,

    /// The prior token in a refresh chain, if issued through the
    /// refresh_token grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_access: Option<Box<AccessData>>,

    /// The access token itself.
    pub access_token: String,

    /// Refresh token, when one was generated for this grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Issuance time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Lifetime of the access token.
    #[serde(with = "humantime_serde")]
    pub expires_in: Duration,

    /// Granted scope. Opaque to the engine.
    pub scope: String,

    /// Redirect URI of the originating request.
    pub redirect_uri: String,

    /// Opaque data carried over from the grant.
    #[serde(default)]
    pub user_data: serde_json::Value,
}

impl AccessData {
    /// Returns the instant the token stops being valid.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.created_at + self.expires_in
    }

    /// Returns `true` if the token is expired at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at() <= now
    }

    /// Returns `true` if the token is expired now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    /// Seconds of validity remaining at the given instant, clamped at zero.
    #[must_use]
    pub fn remaining_at(&self, now: OffsetDateTime) -> u64 {
        let remaining = self.expires_at() - now;
        u64::try_from(remaining.whole_seconds()).unwrap_or(0)
    }

    /// Returns a copy suitable for embedding as a back-reference: its own
    /// back-references are cleared so the chain stays depth-bounded.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        let mut copy = self.clone();
        copy.authorize_data = None;
        copy.prior_access = None;
        copy
    }
}

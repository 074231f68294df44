//! Engine configuration.
//!
//! All fields have serde defaults so a deployment can configure only what
//! it changes. Durations deserialize from humantime strings ("250s", "1h").

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{GrantType, ResponseType};

/// Configuration for the authorization engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Lifetime of issued authorization codes.
    #[serde(with = "humantime_serde")]
    pub authorization_expiration: Duration,

    /// Lifetime of issued access tokens.
    #[serde(with = "humantime_serde")]
    pub access_expiration: Duration,

    /// `token_type` value emitted with access tokens.
    pub token_type: String,

    /// Response types the authorization endpoint accepts.
    pub allowed_authorize_types: Vec<ResponseType>,

    /// Grant types the token endpoint accepts.
    pub allowed_access_types: Vec<GrantType>,

    /// HTTP status code for non-challenge error payloads.
    pub error_status_code: u16,

    /// Accept `client_secret` as a form/query parameter in addition to the
    /// Basic Authorization header.
    pub allow_client_secret_in_params: bool,

    /// Accept token requests over GET in addition to POST.
    pub allow_get_access_request: bool,

    /// Require public clients to send a PKCE challenge with code requests.
    pub require_pkce_for_public_clients: bool,

    /// Separator for a client's registered redirect URI list. Empty means
    /// each client registers exactly one URI.
    pub redirect_uri_separator: String,

    /// Grant types whose intrinsic policy does not demand a client secret.
    /// A deliberate, configurable table: a client's declared method, a
    /// stored secret, or a caller-supplied secret still force verification.
    pub secret_exempt_grant_types: Vec<GrantType>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            authorization_expiration: Duration::from_secs(250),
            access_expiration: Duration::from_secs(3600),
            token_type: "bearer".to_string(),
            allowed_authorize_types: vec![ResponseType::Code],
            allowed_access_types: vec![GrantType::AuthorizationCode],
            error_status_code: 200,
            allow_client_secret_in_params: false,
            allow_get_access_request: false,
            require_pkce_for_public_clients: false,
            redirect_uri_separator: String::new(),
            secret_exempt_grant_types: vec![
                GrantType::Password,
                GrantType::RefreshToken,
                GrantType::AuthorizationCode,
            ],
        }
    }
}

impl ServerConfig {
    /// Returns `true` if the given response type is allow-listed.
    #[must_use]
    pub fn allows_response_type(&self, response_type: ResponseType) -> bool {
        self.allowed_authorize_types.contains(&response_type)
    }

    /// Returns `true` if the given grant type is allow-listed.
    #[must_use]
    pub fn allows_grant_type(&self, grant_type: GrantType) -> bool {
        self.allowed_access_types.contains(&grant_type)
    }

    /// Returns `true` if the grant type's intrinsic policy exempts the
    /// client from presenting a secret.
    #[must_use]
    pub fn is_secret_exempt(&self, grant_type: GrantType) -> bool {
        self.secret_exempt_grant_types.contains(&grant_type)
    }
}

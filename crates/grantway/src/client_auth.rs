//! Client authentication.
//!
//! Resolves the requesting client from the `Authorization` header and/or
//! form credentials, enforces the client's declared authentication method,
//! and applies the grant-type secret policy. A failure records whether the
//! eventual 401 must carry a challenge header, which is the case exactly
//! when an `Authorization` header was present but rejected.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::OAuthError;
use crate::storage::Storage;
use crate::types::{Client, ClientAuthMethod, GrantType};

/// Username/password pair from a `Basic` Authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// The client id.
    pub username: String,
    /// The client secret. May be empty.
    pub password: String,
}

/// Parses a `Basic base64(id:secret)` Authorization header.
///
/// Returns `Ok(None)` when the header uses a different scheme.
///
/// # Errors
///
/// Returns `invalid_request` when the header claims the Basic scheme but
/// the payload is not valid `base64(id:secret)`.
pub fn parse_basic_auth(header: &str) -> Result<Option<BasicAuth>, OAuthError> {
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return Ok(None);
    };
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| OAuthError::invalid_request("malformed Basic Authorization header"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| OAuthError::invalid_request("malformed Basic Authorization header"))?;
    let Some((username, password)) = decoded.split_once(':') else {
        return Err(OAuthError::invalid_request(
            "malformed Basic Authorization header",
        ));
    };
    Ok(Some(BasicAuth {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

/// Extracts the token from a `Bearer token` Authorization header.
#[must_use]
pub fn parse_bearer_auth(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Raw credentials from an inbound request, presence tracked independently
/// of emptiness.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// The raw `Authorization` header, if the request carried one.
    pub authorization_header: Option<String>,
    /// Form/query `client_id`, if present.
    pub client_id: Option<String>,
    /// Form/query `client_secret`, if present.
    pub client_secret: Option<String>,
}

/// A denied authentication attempt.
#[derive(Debug)]
pub struct ClientAuthFailure {
    /// The terminal error.
    pub error: OAuthError,
    /// `true` iff an `Authorization` header was present but rejected, so
    /// the 401 must carry a challenge header.
    pub challenge: bool,
}

impl ClientAuthFailure {
    fn new(error: OAuthError, challenge: bool) -> Self {
        Self { error, challenge }
    }
}

/// Authenticates the requesting client for the given grant type.
///
/// Secret verification is skipped only when every signal agrees it is
/// unnecessary: the grant type is in the configured exempt table, the
/// client declares no authentication method, its stored secret is empty,
/// and the caller supplied no secret. Otherwise a mismatch is fatal.
///
/// # Errors
///
/// Returns a [`ClientAuthFailure`] carrying the denial and the
/// challenge-header flag.
pub async fn authenticate(
    config: &ServerConfig,
    storage: &dyn Storage,
    grant_type: GrantType,
    credentials: &RequestCredentials,
) -> Result<Client, ClientAuthFailure> {
    let header_present = credentials.authorization_header.is_some();

    let basic = match credentials
        .authorization_header
        .as_deref()
        .map(parse_basic_auth)
        .transpose()
    {
        Ok(parsed) => parsed.flatten(),
        Err(error) => return Err(ClientAuthFailure::new(error, header_present)),
    };

    let client_id = basic
        .as_ref()
        .map(|b| b.username.as_str())
        .or(credentials.client_id.as_deref());
    let Some(client_id) = client_id else {
        return Err(ClientAuthFailure::new(
            OAuthError::invalid_request("client_id is required"),
            header_present,
        ));
    };

    let client = match storage.get_client(client_id).await {
        Ok(Some(client)) => client,
        Ok(None) => {
            debug!(client_id, "client authentication failed: unknown client");
            return Err(ClientAuthFailure::new(
                OAuthError::invalid_client("unknown client"),
                header_present,
            ));
        }
        Err(error) => return Err(ClientAuthFailure::new(error, false)),
    };

    if client.redirect_uri.is_empty() {
        return Err(ClientAuthFailure::new(
            OAuthError::unauthorized_client("client has no registered redirect URI"),
            header_present,
        ));
    }

    // Declared-method enforcement happens before any secret comparison.
    let supplied_secret = match client.auth_method {
        ClientAuthMethod::Basic => match &basic {
            Some(b) if !b.username.is_empty() && !b.password.is_empty() => b.password.clone(),
            _ => {
                return Err(ClientAuthFailure::new(
                    OAuthError::invalid_client(
                        "client must authenticate with the Basic Authorization header",
                    ),
                    header_present,
                ));
            }
        },
        ClientAuthMethod::Post => {
            let id_ok = credentials.client_id.as_deref().is_some_and(|v| !v.is_empty());
            let secret = credentials.client_secret.as_deref().unwrap_or("");
            if !id_ok || secret.is_empty() {
                return Err(ClientAuthFailure::new(
                    OAuthError::invalid_client(
                        "client must authenticate with form client_id and client_secret",
                    ),
                    header_present,
                ));
            }
            secret.to_string()
        }
        ClientAuthMethod::None => {
            let from_params = if config.allow_client_secret_in_params {
                credentials.client_secret.as_deref()
            } else {
                None
            };
            basic
                .as_ref()
                .map(|b| b.password.clone())
                .or_else(|| from_params.map(str::to_string))
                .unwrap_or_default()
        }
    };

    let secret_mandatory = !config.is_secret_exempt(grant_type)
        || client.auth_method != ClientAuthMethod::None
        || !client.secret.is_empty()
        || !supplied_secret.is_empty();

    if secret_mandatory {
        match client.secret.verify(&supplied_secret) {
            Ok(true) => {}
            Ok(false) => {
                debug!(client_id, %grant_type, "client authentication failed: secret mismatch");
                return Err(ClientAuthFailure::new(
                    OAuthError::invalid_client("client authentication failed"),
                    header_present,
                ));
            }
            Err(error) => return Err(ClientAuthFailure::new(error, false)),
        }
    }

    Ok(client)
}

//! OAuth 2.0 client registrations and flow enums.

use serde::{Deserialize, Serialize};

use crate::secret::ClientSecret;

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types handled by the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization Code flow.
    AuthorizationCode,
    /// Refresh Token flow.
    RefreshToken,
    /// Resource Owner Password Credentials flow. Legacy; only for trusted
    /// first-party applications.
    Password,
    /// Client Credentials flow.
    ClientCredentials,
    /// Internal bridge used when the authorization endpoint issues tokens
    /// directly (response_type=token). Never accepted on the wire.
    Implicit,
}

impl GrantType {
    /// Returns the OAuth 2.0 `grant_type` parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
            Self::Password => "password",
            Self::ClientCredentials => "client_credentials",
            Self::Implicit => "__implicit",
        }
    }

    /// Parses a wire `grant_type` value.
    ///
    /// The internal implicit bridge is deliberately not reachable from the
    /// wire and returns `None`.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "authorization_code" => Some(Self::AuthorizationCode),
            "refresh_token" => Some(Self::RefreshToken),
            "password" => Some(Self::Password),
            "client_credentials" => Some(Self::ClientCredentials),
            _ => None,
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Response Type
// =============================================================================

/// OAuth 2.0 / OIDC `response_type` elements accepted on the authorization
/// endpoint. A request may carry several, space-separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code issuance.
    Code,
    /// Implicit access token issuance.
    Token,
    /// OpenID Connect id_token issuance.
    IdToken,
}

impl ResponseType {
    /// Returns the wire `response_type` element.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
            Self::IdToken => "id_token",
        }
    }

    /// Parses a single wire `response_type` element.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "code" => Some(Self::Code),
            "token" => Some(Self::Token),
            "id_token" => Some(Self::IdToken),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client
// =============================================================================

/// Whether a client can keep a credential confidential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Browser or native app; cannot hold a secret.
    Public,
    /// Server-side client with a protected secret.
    Confidential,
}

/// Declared token-endpoint authentication method for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// No client authentication (public clients).
    None,
    /// Credentials only via the HTTP Basic Authorization header.
    Basic,
    /// Credentials only via `client_id`/`client_secret` form fields.
    Post,
}

/// OAuth 2.0 client registration.
///
/// Immutable within a request; owned by [`Storage`](crate::storage::Storage).
/// The secret is only ever checked through [`ClientSecret::verify`], never
/// compared in the clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Stored secret representation.
    #[serde(default)]
    pub secret: ClientSecret,

    /// One or more registered redirect URIs. When several are registered
    /// they are joined with the configured separator; the registered set is
    /// the sole authority for redirect validation.
    pub redirect_uri: String,

    /// Declared token-endpoint authentication method.
    pub auth_method: ClientAuthMethod,

    /// Public or confidential.
    pub client_type: ClientType,

    /// Opaque data passed through to storage. Not interpreted by the engine.
    #[serde(default)]
    pub user_data: serde_json::Value,
}

impl Client {
    /// Creates a public client with no secret and no authentication method.
    #[must_use]
    pub fn public(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: ClientSecret::None,
            redirect_uri: redirect_uri.into(),
            auth_method: ClientAuthMethod::None,
            client_type: ClientType::Public,
            user_data: serde_json::Value::Null,
        }
    }

    /// Creates a confidential client with the given stored secret.
    #[must_use]
    pub fn confidential(
        client_id: impl Into<String>,
        secret: ClientSecret,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            secret,
            redirect_uri: redirect_uri.into(),
            auth_method: ClientAuthMethod::Basic,
            client_type: ClientType::Confidential,
            user_data: serde_json::Value::Null,
        }
    }

    /// Sets the declared authentication method.
    #[must_use]
    pub fn with_auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    /// Sets the opaque user data.
    #[must_use]
    pub fn with_user_data(mut self, user_data: serde_json::Value) -> Self {
        self.user_data = user_data;
        self
    }
}

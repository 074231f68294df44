//! OAuth 2.0 error taxonomy.
//!
//! Every failure the engine can produce maps onto the RFC 6749 error
//! vocabulary through [`OAuthError::oauth_error_code`]. Malformed client
//! input never aborts the process; it always resolves to one of these
//! terminal errors, returned to the caller through an
//! [`OAuthResponse`](crate::response::OAuthResponse).

use std::fmt;

/// Errors produced while handling authorization and token requests.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OAuthError {
    /// The request is missing a parameter, malformed, or otherwise invalid.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what was malformed or missing.
        message: String,
    },

    /// Client authentication failed.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client failed to authenticate.
        message: String,
    },

    /// The client is not authorized to use this flow.
    #[error("Unauthorized client: {message}")]
    UnauthorizedClient {
        /// Description of why the client is not authorized.
        message: String,
    },

    /// The grant (code, refresh token) is missing, expired, or mis-owned.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The requested scope is invalid or exceeds what was granted.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// Description of why the scope is invalid.
        message: String,
    },

    /// The resource owner or the server denied the request.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description of the denial.
        message: String,
    },

    /// The requested response type is not allowed by configuration.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The offending response type.
        response_type: String,
    },

    /// The requested grant type is not allowed by configuration.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The offending grant type.
        grant_type: String,
    },

    /// A storage operation failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Signing an id_token failed or no suitable algorithm exists.
    #[error("Signing error: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// An unexpected internal failure (token generation, serialization).
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal failure.
        message: String,
    },
}

impl OAuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `UnauthorizedClient` error.
    #[must_use]
    pub fn unauthorized_client(message: impl Into<String>) -> Self {
        Self::UnauthorizedClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error.
    #[must_use]
    pub fn unsupported_response_type(response_type: impl Into<String>) -> Self {
        Self::UnsupportedResponseType {
            response_type: response_type.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the RFC 6749 error code emitted to the client.
    #[must_use]
    pub fn oauth_error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::InvalidClient { .. } => ErrorCode::InvalidClient,
            Self::UnauthorizedClient { .. } => ErrorCode::UnauthorizedClient,
            Self::InvalidGrant { .. } => ErrorCode::InvalidGrant,
            Self::InvalidScope { .. } => ErrorCode::InvalidScope,
            Self::AccessDenied { .. } => ErrorCode::AccessDenied,
            Self::UnsupportedResponseType { .. } => ErrorCode::UnsupportedResponseType,
            Self::UnsupportedGrantType { .. } => ErrorCode::UnsupportedGrantType,
            Self::Storage { .. } | Self::Signing { .. } | Self::Internal { .. } => {
                ErrorCode::ServerError
            }
        }
    }

    /// Returns `true` if this error is attributable to the client (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if this error is a collaborator/server failure (5xx category).
    ///
    /// Server errors keep their cause server-side; only the bare
    /// `server_error` code and its default description are emitted.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Signing { .. } | Self::Internal { .. }
        )
    }
}

/// RFC 6749 / 7636 error codes emitted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed or missing input.
    InvalidRequest,
    /// Client authentication failure.
    InvalidClient,
    /// Client not allowed to use this flow.
    UnauthorizedClient,
    /// Missing, expired, or mis-owned grant artifact.
    InvalidGrant,
    /// Invalid or over-broad scope.
    InvalidScope,
    /// Consent refused or request denied.
    AccessDenied,
    /// Response type not allow-listed.
    UnsupportedResponseType,
    /// Grant type not allow-listed.
    UnsupportedGrantType,
    /// Collaborator failure; cause retained server-side.
    ServerError,
}

impl ErrorCode {
    /// Returns the wire representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidScope => "invalid_scope",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::ServerError => "server_error",
        }
    }

    /// Returns the default `error_description` used when none is supplied.
    #[must_use]
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::InvalidRequest => {
                "The request is missing a required parameter, includes an invalid parameter value, or is otherwise malformed."
            }
            Self::InvalidClient => "Client authentication failed.",
            Self::UnauthorizedClient => {
                "The client is not authorized to request a token using this method."
            }
            Self::InvalidGrant => {
                "The provided authorization grant is invalid, expired, or revoked."
            }
            Self::InvalidScope => "The requested scope is invalid, unknown, or malformed.",
            Self::AccessDenied => "The resource owner or authorization server denied the request.",
            Self::UnsupportedResponseType => {
                "The authorization server does not support obtaining a token using this method."
            }
            Self::UnsupportedGrantType => {
                "The authorization grant type is not supported by the authorization server."
            }
            Self::ServerError => {
                "The authorization server encountered an unexpected condition which prevented it from fulfilling the request."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

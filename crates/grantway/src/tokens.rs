//! Token generation.
//!
//! Authorization codes, access tokens and refresh tokens are opaque
//! unpredictable strings. The default generator draws from the operating
//! system CSPRNG; a failing random source aborts issuance, since falling
//! back to anything weaker would silently break the unpredictability
//! guarantee.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::OAuthResult;
use crate::error::OAuthError;
use crate::types::{AccessData, AuthorizeData};

/// Token material for a successful access grant.
#[derive(Debug, Clone)]
pub struct GeneratedTokens {
    /// The access token.
    pub access_token: String,
    /// Refresh token, present iff one was requested.
    pub refresh_token: Option<String>,
}

/// Produces authorization codes and access/refresh tokens.
///
/// Implementations receive the data record being issued so deployments can
/// derive structured tokens (e.g. self-describing formats) if they choose;
/// the default implementation ignores it and returns pure randomness.
pub trait TokenGenerator: Send + Sync {
    /// Generates an authorization code for the given pending record.
    ///
    /// # Errors
    ///
    /// Returns an error if the randomness source fails.
    fn authorize_code(&self, data: &AuthorizeData) -> OAuthResult<String>;

    /// Generates an access token, plus a refresh token when requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the randomness source fails.
    fn access_token(&self, data: &AccessData, generate_refresh: bool)
    -> OAuthResult<GeneratedTokens>;
}

/// Default generator: fixed-length CSPRNG output, URL-safe base64 without
/// padding.
#[derive(Debug, Clone, Copy)]
pub struct RandomTokenGenerator {
    token_bytes: usize,
}

impl RandomTokenGenerator {
    /// Creates a generator producing tokens from `token_bytes` random bytes.
    /// Anything below 16 bytes (128 bits) is rounded up to 16.
    #[must_use]
    pub fn new(token_bytes: usize) -> Self {
        Self {
            token_bytes: token_bytes.max(16),
        }
    }

    fn random_token(&self) -> OAuthResult<String> {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| OAuthError::internal(format!("secure random source failed: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn authorize_code(&self, _data: &AuthorizeData) -> OAuthResult<String> {
        self.random_token()
    }

    fn access_token(
        &self,
        _data: &AccessData,
        generate_refresh: bool,
    ) -> OAuthResult<GeneratedTokens> {
        Ok(GeneratedTokens {
            access_token: self.random_token()?,
            refresh_token: if generate_refresh {
                Some(self.random_token()?)
            } else {
                None
            },
        })
    }
}

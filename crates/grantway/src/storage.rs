//! Persistence contract.
//!
//! The engine owns no state; everything durable lives behind this trait.
//! Absence is `Ok(None)`, infrastructure failure is `Err`. Implementations
//! are responsible for their own concurrency safety, including the race
//! between concurrent redemptions of the same refresh token.

use std::sync::Arc;

use async_trait::async_trait;

use crate::OAuthResult;
use crate::signing::IdTokenSigner;
use crate::types::{AccessData, AuthorizeData, Client};

/// Persistence for clients, authorization codes and tokens.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Looks up a client registration by id.
    async fn get_client(&self, client_id: &str) -> OAuthResult<Option<Client>>;

    /// Persists authorization code data, keyed by its code.
    async fn save_authorize(&self, data: AuthorizeData) -> OAuthResult<()>;

    /// Loads authorization code data by code.
    async fn load_authorize(&self, code: &str) -> OAuthResult<Option<AuthorizeData>>;

    /// Deletes authorization code data. Removing an unknown code is not an
    /// error.
    async fn remove_authorize(&self, code: &str) -> OAuthResult<()>;

    /// Persists access token data, keyed by its access token and, when
    /// present, indexed by its refresh token.
    async fn save_access(&self, data: AccessData) -> OAuthResult<()>;

    /// Loads access token data by access token.
    async fn load_access(&self, token: &str) -> OAuthResult<Option<AccessData>>;

    /// Deletes access token data by access token.
    async fn remove_access(&self, token: &str) -> OAuthResult<()>;

    /// Loads access token data by refresh token.
    async fn load_refresh(&self, token: &str) -> OAuthResult<Option<AccessData>>;

    /// Deletes the refresh-token index entry.
    async fn remove_refresh(&self, token: &str) -> OAuthResult<()>;

    /// Returns the signer for a client's id_tokens, when the deployment
    /// provisions one. The default implementation provisions none.
    async fn get_signing_key(
        &self,
        _client_id: &str,
    ) -> OAuthResult<Option<Arc<dyn IdTokenSigner>>> {
        Ok(None)
    }
}

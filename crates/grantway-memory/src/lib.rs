//! In-memory storage backend for the grantway engine.
//!
//! Lock-free concurrent maps, suitable for tests, demos and single-node
//! deployments that do not need durability. Refresh tokens are an index
//! into the access table, so rotating a token through either key keeps
//! both views consistent.

use std::sync::Arc;

use async_trait::async_trait;
use papaya::HashMap;

use grantway::OAuthResult;
use grantway::signing::IdTokenSigner;
use grantway::storage::Storage;
use grantway::types::{AccessData, AuthorizeData, Client};

/// Non-durable storage backed by concurrent hash maps.
#[derive(Default)]
pub struct MemoryStorage {
    clients: HashMap<String, Client>,
    authorize: HashMap<String, AuthorizeData>,
    access: HashMap<String, AccessData>,
    refresh: HashMap<String, String>,
    signers: HashMap<String, Arc<dyn IdTokenSigner>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client.
    pub fn register_client(&self, client: Client) {
        self.clients.pin().insert(client.client_id.clone(), client);
    }

    /// Registers an id_token signer for a client.
    pub fn register_signer(&self, client_id: impl Into<String>, signer: Arc<dyn IdTokenSigner>) {
        self.signers.pin().insert(client_id.into(), signer);
    }

    /// Number of pending authorization codes.
    #[must_use]
    pub fn authorize_count(&self) -> usize {
        self.authorize.pin().len()
    }

    /// Number of live access tokens.
    #[must_use]
    pub fn access_count(&self) -> usize {
        self.access.pin().len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_client(&self, client_id: &str) -> OAuthResult<Option<Client>> {
        Ok(self.clients.pin().get(client_id).cloned())
    }

    async fn save_authorize(&self, data: AuthorizeData) -> OAuthResult<()> {
        self.authorize.pin().insert(data.code.clone(), data);
        Ok(())
    }

    async fn load_authorize(&self, code: &str) -> OAuthResult<Option<AuthorizeData>> {
        Ok(self.authorize.pin().get(code).cloned())
    }

    async fn remove_authorize(&self, code: &str) -> OAuthResult<()> {
        self.authorize.pin().remove(code);
        Ok(())
    }

    async fn save_access(&self, data: AccessData) -> OAuthResult<()> {
        if let Some(refresh) = &data.refresh_token {
            self.refresh
                .pin()
                .insert(refresh.clone(), data.access_token.clone());
        }
        self.access.pin().insert(data.access_token.clone(), data);
        Ok(())
    }

    async fn load_access(&self, token: &str) -> OAuthResult<Option<AccessData>> {
        Ok(self.access.pin().get(token).cloned())
    }

    async fn remove_access(&self, token: &str) -> OAuthResult<()> {
        self.access.pin().remove(token);
        Ok(())
    }

    async fn load_refresh(&self, token: &str) -> OAuthResult<Option<AccessData>> {
        let access_token = self.refresh.pin().get(token).cloned();
        match access_token {
            Some(access_token) => Ok(self.access.pin().get(&access_token).cloned()),
            None => Ok(None),
        }
    }

    async fn remove_refresh(&self, token: &str) -> OAuthResult<()> {
        self.refresh.pin().remove(token);
        Ok(())
    }

    async fn get_signing_key(
        &self,
        client_id: &str,
    ) -> OAuthResult<Option<Arc<dyn IdTokenSigner>>> {
        Ok(self.signers.pin().get(client_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::OffsetDateTime;

    use super::*;

    fn authorize_data(code: &str) -> AuthorizeData {
        AuthorizeData {
            client: Client::public("1234", "http://h/appauth"),
            code: code.to_string(),
            created_at: OffsetDateTime::now_utc(),
            expires_in: Duration::from_secs(250),
            scope: "everything".into(),
            redirect_uri: "http://h/appauth".into(),
            state: "a".into(),
            user_data: serde_json::Value::Null,
            code_challenge: None,
            code_challenge_method: None,
        }
    }

    #[tokio::test]
    async fn test_authorize_round_trip() {
        let storage = MemoryStorage::new();
        storage.save_authorize(authorize_data("c0de")).await.unwrap();

        let loaded = storage.load_authorize("c0de").await.unwrap().unwrap();
        assert_eq!(loaded.client.client_id, "1234");
        assert_eq!(loaded.scope, "everything");
        assert_eq!(loaded.redirect_uri, "http://h/appauth");

        storage.remove_authorize("c0de").await.unwrap();
        assert!(storage.load_authorize("c0de").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_indexes_access() {
        let storage = MemoryStorage::new();
        let data = AccessData {
            client: Client::public("1234", "http://h/appauth"),
            authorize_data: None,
            prior_access: None,
            access_token: "tok".into(),
            refresh_token: Some("ref".into()),
            created_at: OffsetDateTime::now_utc(),
            expires_in: Duration::from_secs(3600),
            scope: String::new(),
            redirect_uri: "http://h/appauth".into(),
            user_data: serde_json::Value::Null,
        };
        storage.save_access(data).await.unwrap();

        let via_refresh = storage.load_refresh("ref").await.unwrap().unwrap();
        assert_eq!(via_refresh.access_token, "tok");

        storage.remove_refresh("ref").await.unwrap();
        assert!(storage.load_refresh("ref").await.unwrap().is_none());
        // The access record itself is untouched until removed explicitly.
        assert!(storage.load_access("tok").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_keys_are_none() {
        let storage = MemoryStorage::new();
        assert!(storage.get_client("ghost").await.unwrap().is_none());
        assert!(storage.load_authorize("ghost").await.unwrap().is_none());
        assert!(storage.load_access("ghost").await.unwrap().is_none());
        assert!(storage.load_refresh("ghost").await.unwrap().is_none());
        assert!(storage.get_signing_key("ghost").await.unwrap().is_none());
    }
}

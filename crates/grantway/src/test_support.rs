//! Shared in-memory storage mock for handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::OAuthResult;
use crate::error::OAuthError;
use crate::signing::IdTokenSigner;
use crate::storage::Storage;
use crate::types::{AccessData, AuthorizeData, Client};

/// Mutex-backed storage with optional failure injection.
#[derive(Default)]
pub(crate) struct MockStorage {
    clients: Mutex<HashMap<String, Client>>,
    authorize: Mutex<HashMap<String, AuthorizeData>>,
    access: Mutex<HashMap<String, AccessData>>,
    refresh: Mutex<HashMap<String, String>>,
    signers: Mutex<HashMap<String, Arc<dyn IdTokenSigner>>>,
    fail: bool,
}

impl MockStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_client(client: Client) -> Self {
        let storage = Self::new();
        storage.add_client(client);
        storage
    }

    /// Every operation reports a storage failure.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn add_client(&self, client: Client) {
        self.clients
            .lock()
            .unwrap()
            .insert(client.client_id.clone(), client);
    }

    pub(crate) fn add_signer(&self, client_id: &str, signer: Arc<dyn IdTokenSigner>) {
        self.signers
            .lock()
            .unwrap()
            .insert(client_id.to_string(), signer);
    }

    pub(crate) fn authorize_count(&self) -> usize {
        self.authorize.lock().unwrap().len()
    }

    fn check(&self) -> OAuthResult<()> {
        if self.fail {
            Err(OAuthError::storage("injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn get_client(&self, client_id: &str) -> OAuthResult<Option<Client>> {
        self.check()?;
        Ok(self.clients.lock().unwrap().get(client_id).cloned())
    }

    async fn save_authorize(&self, data: AuthorizeData) -> OAuthResult<()> {
        self.check()?;
        self.authorize.lock().unwrap().insert(data.code.clone(), data);
        Ok(())
    }

    async fn load_authorize(&self, code: &str) -> OAuthResult<Option<AuthorizeData>> {
        self.check()?;
        Ok(self.authorize.lock().unwrap().get(code).cloned())
    }

    async fn remove_authorize(&self, code: &str) -> OAuthResult<()> {
        self.check()?;
        self.authorize.lock().unwrap().remove(code);
        Ok(())
    }

    async fn save_access(&self, data: AccessData) -> OAuthResult<()> {
        self.check()?;
        if let Some(refresh) = &data.refresh_token {
            self.refresh
                .lock()
                .unwrap()
                .insert(refresh.clone(), data.access_token.clone());
        }
        self.access
            .lock()
            .unwrap()
            .insert(data.access_token.clone(), data);
        Ok(())
    }

    async fn load_access(&self, token: &str) -> OAuthResult<Option<AccessData>> {
        self.check()?;
        Ok(self.access.lock().unwrap().get(token).cloned())
    }

    async fn remove_access(&self, token: &str) -> OAuthResult<()> {
        self.check()?;
        self.access.lock().unwrap().remove(token);
        Ok(())
    }

    async fn load_refresh(&self, token: &str) -> OAuthResult<Option<AccessData>> {
        self.check()?;
        let access_token = self.refresh.lock().unwrap().get(token).cloned();
        match access_token {
            Some(access_token) => Ok(self.access.lock().unwrap().get(&access_token).cloned()),
            None => Ok(None),
        }
    }

    async fn remove_refresh(&self, token: &str) -> OAuthResult<()> {
        self.check()?;
        self.refresh.lock().unwrap().remove(token);
        Ok(())
    }

    async fn get_signing_key(
        &self,
        client_id: &str,
    ) -> OAuthResult<Option<Arc<dyn IdTokenSigner>>> {
        self.check()?;
        Ok(self.signers.lock().unwrap().get(client_id).cloned())
    }
}

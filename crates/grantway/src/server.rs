//! Engine wiring.
//!
//! A [`Server`] bundles the immutable configuration with the collaborators
//! the handlers need: storage, the token generator, the optional refresh
//! scope policy, and a clock. The handler entry points live beside their
//! state machines in [`authorize`](crate::authorize),
//! [`access`](crate::access) and [`info`](crate::info).

use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::ServerConfig;
use crate::response::OAuthResponse;
use crate::scope::RefreshScopePolicy;
use crate::storage::Storage;
use crate::tokens::{RandomTokenGenerator, TokenGenerator};

/// The authorization engine.
pub struct Server {
    config: ServerConfig,
    storage: Arc<dyn Storage>,
    token_generator: Arc<dyn TokenGenerator>,
    refresh_scope_policy: Option<Arc<dyn RefreshScopePolicy>>,
    clock: fn() -> OffsetDateTime,
}

impl Server {
    /// Creates a server over the given storage with the default CSPRNG
    /// token generator and no refresh scope policy.
    #[must_use]
    pub fn new(config: ServerConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            storage,
            token_generator: Arc::new(RandomTokenGenerator::default()),
            refresh_scope_policy: None,
            clock: OffsetDateTime::now_utc,
        }
    }

    /// Replaces the token generator.
    #[must_use]
    pub fn with_token_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.token_generator = generator;
        self
    }

    /// Installs a policy applied to scope overrides on refresh requests.
    #[must_use]
    pub fn with_refresh_scope_policy(mut self, policy: Arc<dyn RefreshScopePolicy>) -> Self {
        self.refresh_scope_policy = Some(policy);
        self
    }

    /// Replaces the clock. Tests use this to pin time.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The storage collaborator.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub(crate) fn token_generator(&self) -> &dyn TokenGenerator {
        self.token_generator.as_ref()
    }

    pub(crate) fn refresh_scope_policy(&self) -> Option<&dyn RefreshScopePolicy> {
        self.refresh_scope_policy.as_deref()
    }

    pub(crate) fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    /// Creates an empty response using the configured error status code.
    #[must_use]
    pub fn new_response(&self) -> OAuthResponse {
        OAuthResponse::new(self.config.error_status_code)
    }
}

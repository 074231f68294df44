//! OAuth 2.0 authorization server engine.
//!
//! Implements the grant-type state machines and protocol validation of
//! RFC 6749, PKCE (RFC 7636) and a subset of the OpenID Connect hybrid
//! flows. The engine owns no transport and no persistence: hosts feed it
//! parsed wire parameters, supply a [`storage::Storage`] implementation,
//! and emit the [`response::OAuthResponse`] it produces.
//!
//! # Modules
//!
//! - [`access`] - token endpoint state machine
//! - [`authorize`] - authorization endpoint state machine
//! - [`client_auth`] - client authentication and header parsing
//! - [`config`] - engine configuration
//! - [`error`] - OAuth error taxonomy
//! - [`info`] - bearer token info requests
//! - [`redirect`] - redirect URI validation
//! - [`response`] - output produced for the response emitter
//! - [`scope`] - opaque scope helpers and refresh scope policies
//! - [`secret`] - client secret strategies
//! - [`server`] - engine wiring
//! - [`signing`] - id_token signer abstraction
//! - [`storage`] - persistence contract
//! - [`tokens`] - token generation
//! - [`types`] - domain types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use grantway::authorize::AuthorizeParams;
//! use grantway::config::ServerConfig;
//! use grantway::server::Server;
//! use grantway::storage::Storage;
//!
//! async fn handle(storage: Arc<dyn Storage>) {
//!     let server = Server::new(ServerConfig::default(), storage);
//!     let params = AuthorizeParams {
//!         response_type: Some("code".into()),
//!         client_id: Some("1234".into()),
//!         state: Some("a".into()),
//!         ..Default::default()
//!     };
//!     match server.authorize_request(params).await {
//!         Ok(mut request) => {
//!             // Present the consent screen, then:
//!             request.approve(serde_json::Value::Null);
//!             let resp = server.finish_authorize(request).await;
//!             let _ = resp.redirect_target();
//!         }
//!         Err(resp) => {
//!             let _ = resp.output;
//!         }
//!     }
//! }
//! ```

pub mod access;
pub mod authorize;
pub mod client_auth;
pub mod config;
pub mod error;
pub mod info;
pub mod redirect;
pub mod response;
pub mod scope;
pub mod secret;
pub mod server;
pub mod signing;
pub mod storage;
pub mod tokens;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::{AccessRequest, TokenParams};
pub use authorize::{AuthorizationRequest, AuthorizeParams};
pub use config::ServerConfig;
pub use error::{ErrorCode, OAuthError};
pub use info::InfoParams;
pub use response::{OAuthResponse, ResponseKind};
pub use server::Server;
pub use storage::Storage;
pub use types::{
    AccessData, AuthorizeData, Client, ClientAuthMethod, ClientType, CodeChallengeMethod,
    GrantType, ResponseType,
};

/// Result type used throughout the engine.
pub type OAuthResult<T> = Result<T, OAuthError>;

//! Token info requests.
//!
//! Not an RFC endpoint: given a bearer access token, reports what remains
//! of the grant. Useful for resource servers that delegate validation to
//! the engine's storage.

use tracing::debug;

use crate::client_auth::parse_bearer_auth;
use crate::error::OAuthError;
use crate::response::OAuthResponse;
use crate::server::Server;

/// Wire parameters of a token info request. The token travels either in a
/// `Bearer` Authorization header or in the `code` field.
#[derive(Debug, Clone, Default)]
pub struct InfoParams {
    /// The raw `Authorization` header, if present.
    pub authorization_header: Option<String>,
    /// Fallback `code` field carrying the access token.
    pub code: Option<String>,
}

impl Server {
    /// Reports the state of a bearer access token.
    pub async fn info_request(&self, params: InfoParams) -> OAuthResponse {
        let mut resp = self.new_response();

        let token = params
            .authorization_header
            .as_deref()
            .and_then(parse_bearer_auth)
            .map(str::to_string)
            .or_else(|| params.code.clone().filter(|c| !c.is_empty()));
        let Some(token) = token else {
            resp.set_error(
                OAuthError::invalid_request("bearer token is required"),
                "",
            );
            return resp;
        };

        let access = match self.storage().load_access(&token).await {
            Ok(Some(access)) => access,
            Ok(None) => {
                resp.set_error(OAuthError::invalid_grant("unknown access token"), "");
                return resp;
            }
            Err(error) => {
                resp.set_error(error, "");
                return resp;
            }
        };

        let now = self.now();
        if access.is_expired_at(now) {
            resp.set_error(OAuthError::invalid_grant("access token expired"), "");
            return resp;
        }

        debug!(client_id = %access.client.client_id, "token info request served");

        resp.set_output("access_token", access.access_token.clone());
        resp.set_output("token_type", self.config().token_type.clone());
        resp.set_output("expires_in", access.remaining_at(now));
        if let Some(refresh_token) = &access.refresh_token {
            resp.set_output("refresh_token", refresh_token.clone());
        }
        if !access.scope.is_empty() {
            resp.set_output("scope", access.scope.clone());
        }
        resp
    }
}

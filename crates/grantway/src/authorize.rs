//! Authorization endpoint state machine.
//!
//! Two-phase handling, mirroring the consent interaction:
//!
//! 1. [`Server::authorize_request`] validates the wire parameters and
//!    returns an unauthorized [`AuthorizationRequest`] for the host to
//!    present to the resource owner.
//! 2. After a decision, [`Server::finish_authorize`] turns the request
//!    into the terminal response: an authorization code, implicit tokens,
//!    an id_token, any hybrid combination of those, or a denial.
//!
//! Errors discovered before the redirect URI has been validated are
//! delivered as a direct payload; everything after travels on a redirect
//! to the validated URI with `state` preserved.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::access::AccessRequest;
use crate::error::OAuthError;
use crate::redirect::{first_uri, validate_uri_list};
use crate::response::OAuthResponse;
use crate::scope::scope_contains;
use crate::server::Server;
use crate::signing::algorithm_for_key;
use crate::types::{AuthorizeData, Client, ClientType, CodeChallengeMethod, ResponseType};

static CODE_CHALLENGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9~._-]{43,128}$").expect("valid regex"));

/// Wire parameters of an authorization request.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeParams {
    /// Space-separated `response_type`.
    pub response_type: Option<String>,
    /// `client_id`.
    pub client_id: Option<String>,
    /// `redirect_uri`.
    pub redirect_uri: Option<String>,
    /// `scope`.
    pub scope: Option<String>,
    /// `state`, echoed back opaquely.
    pub state: Option<String>,
    /// OIDC `nonce`.
    pub nonce: Option<String>,
    /// PKCE `code_challenge`.
    pub code_challenge: Option<String>,
    /// PKCE `code_challenge_method`.
    pub code_challenge_method: Option<String>,
}

/// A validated authorization request awaiting the resource owner's
/// decision. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// The requesting client.
    pub client: Client,
    /// Requested response types, in request order.
    pub response_types: Vec<ResponseType>,
    /// Requested scope.
    pub scope: String,
    /// Validated redirect URI the response will be delivered to.
    pub redirect_uri: String,
    /// Opaque client state.
    pub state: String,
    /// OIDC nonce, empty when absent.
    pub nonce: String,
    /// PKCE challenge.
    pub code_challenge: Option<String>,
    /// PKCE transformation.
    pub code_challenge_method: Option<CodeChallengeMethod>,
    /// Lifetime for an issued authorization code.
    pub expires_in: Duration,
    /// Set by the host after consent.
    pub authorized: bool,
    /// Opaque data attached by the host; carried onto issued records.
    pub user_data: Value,
}

impl AuthorizationRequest {
    /// Marks the request approved, attaching the host's opaque data.
    pub fn approve(&mut self, user_data: Value) {
        self.authorized = true;
        self.user_data = user_data;
    }
}

impl Server {
    /// Validates an authorization request.
    ///
    /// On success returns an unauthorized [`AuthorizationRequest`]; the
    /// host attaches the consent decision and calls
    /// [`finish_authorize`](Self::finish_authorize).
    ///
    /// # Errors
    ///
    /// Returns a terminal [`OAuthResponse`]: a redirect when the redirect
    /// URI had already been validated, a direct payload otherwise.
    pub async fn authorize_request(
        &self,
        params: AuthorizeParams,
    ) -> Result<AuthorizationRequest, OAuthResponse> {
        let state = params.state.clone().unwrap_or_default();

        let side_channel = |error: OAuthError| {
            let mut resp = self.new_response();
            resp.set_error(error, &state);
            resp
        };

        let raw_types = params.response_type.clone().unwrap_or_default();
        let mut response_types: Vec<ResponseType> = Vec::new();
        for element in raw_types.split(' ').filter(|s| !s.is_empty()) {
            let Some(response_type) = ResponseType::from_wire(element) else {
                return Err(side_channel(OAuthError::unsupported_response_type(element)));
            };
            if !self.config().allows_response_type(response_type) {
                return Err(side_channel(OAuthError::unsupported_response_type(element)));
            }
            if !response_types.contains(&response_type) {
                response_types.push(response_type);
            }
        }
        if response_types.is_empty() {
            return Err(side_channel(OAuthError::invalid_request(
                "response_type is required",
            )));
        }

        let client_id = params.client_id.clone().unwrap_or_default();
        if client_id.is_empty() {
            return Err(side_channel(OAuthError::invalid_request(
                "client_id is required",
            )));
        }
        let client = match self.storage().get_client(&client_id).await {
            Ok(Some(client)) => client,
            Ok(None) => {
                return Err(side_channel(OAuthError::unauthorized_client(
                    "unknown client",
                )));
            }
            Err(error) => return Err(side_channel(error)),
        };
        if client.redirect_uri.is_empty() {
            return Err(side_channel(OAuthError::unauthorized_client(
                "client has no registered redirect URI",
            )));
        }

        let separator = self.config().redirect_uri_separator.clone();
        let requested_uri = params.redirect_uri.clone().unwrap_or_default();
        let redirect_uri = if requested_uri.is_empty() {
            if !separator.is_empty() && client.redirect_uri.contains(separator.as_str()) {
                return Err(side_channel(OAuthError::invalid_request(
                    "redirect_uri is required when several URIs are registered",
                )));
            }
            first_uri(&client.redirect_uri, &separator).to_string()
        } else {
            match validate_uri_list(&client.redirect_uri, &requested_uri, &separator) {
                Ok(uri) => uri,
                Err(error) => return Err(side_channel(error)),
            }
        };

        // The redirect URI is validated; remaining errors travel on it.
        let deny = |error: OAuthError| {
            let mut resp = self.new_response();
            resp.set_redirect(redirect_uri.clone());
            resp.set_error(error, &state);
            resp
        };

        let code_challenge = params.code_challenge.clone().filter(|c| !c.is_empty());
        let mut code_challenge_method = None;
        if let Some(challenge) = &code_challenge {
            if !CODE_CHALLENGE_RE.is_match(challenge) {
                return Err(deny(OAuthError::invalid_request(
                    "code_challenge must be 43-128 characters from [A-Za-z0-9~._-]",
                )));
            }
            let raw_method = params.code_challenge_method.clone().unwrap_or_default();
            match CodeChallengeMethod::from_wire(&raw_method) {
                Some(method) => code_challenge_method = Some(method),
                None => {
                    return Err(deny(OAuthError::invalid_request(
                        "code_challenge_method must be plain or S256",
                    )));
                }
            }
        } else if self.config().require_pkce_for_public_clients
            && client.client_type == ClientType::Public
            && response_types.contains(&ResponseType::Code)
        {
            return Err(deny(OAuthError::invalid_request(
                "code_challenge is required for public clients",
            )));
        }

        let scope = params.scope.clone().unwrap_or_default();
        let nonce = params.nonce.clone().unwrap_or_default();
        if scope_contains(&scope, "openid") {
            if response_types == [ResponseType::Token] {
                return Err(deny(OAuthError::invalid_request(
                    "response_type token alone cannot be combined with the openid scope",
                )));
            }
            let implicit_or_hybrid = response_types.contains(&ResponseType::Token)
                || response_types.contains(&ResponseType::IdToken);
            if implicit_or_hybrid && nonce.is_empty() {
                return Err(deny(OAuthError::invalid_request(
                    "nonce is required for implicit and hybrid flows",
                )));
            }
        }

        debug!(
            client_id = %client.client_id,
            response_type = %raw_types,
            "authorization request validated"
        );

        Ok(AuthorizationRequest {
            client,
            response_types,
            scope,
            redirect_uri,
            state,
            nonce,
            code_challenge,
            code_challenge_method,
            expires_in: self.config().authorization_expiration,
            authorized: false,
            user_data: Value::Null,
        })
    }

    /// Produces the terminal authorization response after the resource
    /// owner's decision has been attached.
    pub async fn finish_authorize(&self, request: AuthorizationRequest) -> OAuthResponse {
        let mut resp = self.new_response();
        resp.set_redirect(request.redirect_uri.clone());

        if !request.authorized {
            warn!(client_id = %request.client.client_id, "authorization denied by resource owner");
            resp.set_error(
                OAuthError::access_denied("the resource owner denied the request"),
                &request.state,
            );
            return resp;
        }

        for response_type in &request.response_types {
            match response_type {
                ResponseType::Code => {
                    if let Err(error) = self.issue_code(&mut resp, &request).await {
                        resp.set_error(error, &request.state);
                        return resp;
                    }
                }
                ResponseType::Token => {
                    resp.set_redirect_fragment(true);
                    // Implicit tokens ride the access machinery with
                    // refresh generation forced off.
                    let access_request = AccessRequest::implicit(
                        request.client.clone(),
                        request.scope.clone(),
                        request.redirect_uri.clone(),
                        self.config().access_expiration,
                        request.user_data.clone(),
                    );
                    self.finish_access_into(&mut resp, access_request).await;
                    if resp.is_error() {
                        // Re-route the denial onto the validated redirect.
                        resp.set_redirect(request.redirect_uri.clone());
                        if !request.state.is_empty() {
                            resp.set_output("state", request.state.clone());
                        }
                        return resp;
                    }
                }
                ResponseType::IdToken => {
                    resp.set_redirect_fragment(true);
                    if let Err(error) = self.issue_id_token(&mut resp, &request).await {
                        resp.set_error(error, &request.state);
                        return resp;
                    }
                }
            }
        }

        if !request.state.is_empty() {
            resp.set_output("state", request.state.clone());
        }
        resp
    }

    async fn issue_code(
        &self,
        resp: &mut OAuthResponse,
        request: &AuthorizationRequest,
    ) -> Result<(), OAuthError> {
        let mut data = AuthorizeData {
            client: request.client.clone(),
            code: String::new(),
            created_at: self.now(),
            expires_in: request.expires_in,
            scope: request.scope.clone(),
            redirect_uri: request.redirect_uri.clone(),
            state: request.state.clone(),
            user_data: request.user_data.clone(),
            code_challenge: request.code_challenge.clone(),
            code_challenge_method: request.code_challenge_method,
        };
        data.code = self.token_generator().authorize_code(&data)?;
        let code = data.code.clone();
        self.storage().save_authorize(data).await?;
        resp.set_output("code", code);
        Ok(())
    }

    async fn issue_id_token(
        &self,
        resp: &mut OAuthResponse,
        request: &AuthorizationRequest,
    ) -> Result<(), OAuthError> {
        let signer = self
            .storage()
            .get_signing_key(&request.client.client_id)
            .await?
            .ok_or_else(|| OAuthError::signing("no signing key registered for client"))?;
        let algorithm = algorithm_for_key(&signer.key_kind())?;

        let mut claims = match &request.user_data {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("sub".to_string(), other.clone());
                map
            }
        };
        if !request.nonce.is_empty() {
            claims.insert("nonce".to_string(), Value::String(request.nonce.clone()));
        }

        let id_token = signer.sign(algorithm, &Value::Object(claims))?;
        resp.set_output("id_token", id_token);
        Ok(())
    }
}

//! Token endpoint state machine.
//!
//! [`Server::access_request`] authenticates the client and validates the
//! request per grant type; the host then verifies anything outside the
//! engine's reach (resource-owner passwords), marks the request
//! authorized, and calls [`Server::finish_access`] to issue the tokens,
//! rotate refresh chains and clean up consumed artifacts.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::client_auth::{self, ClientAuthFailure, RequestCredentials};
use crate::error::OAuthError;
use crate::redirect::{first_uri, validate_uri_list};
use crate::response::OAuthResponse;
use crate::server::Server;
use crate::types::{AccessData, AuthorizeData, Client, CodeChallengeMethod, GrantType};

/// Realm reported in `WWW-Authenticate` challenges.
const CHALLENGE_REALM: &str = "oauth";

/// Wire parameters of a token request.
#[derive(Debug, Clone)]
pub struct TokenParams {
    /// HTTP method of the request ("POST" or "GET").
    pub method: String,
    /// The raw `Authorization` header, if present.
    pub authorization_header: Option<String>,
    /// `grant_type`.
    pub grant_type: Option<String>,
    /// `code`, for the authorization_code grant.
    pub code: Option<String>,
    /// `redirect_uri`.
    pub redirect_uri: Option<String>,
    /// `client_id`.
    pub client_id: Option<String>,
    /// `client_secret`.
    pub client_secret: Option<String>,
    /// `username`, for the password grant.
    pub username: Option<String>,
    /// `password`, for the password grant.
    pub password: Option<String>,
    /// `refresh_token`.
    pub refresh_token: Option<String>,
    /// `scope`.
    pub scope: Option<String>,
    /// PKCE `code_verifier`.
    pub code_verifier: Option<String>,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            method: "POST".to_string(),
            authorization_header: None,
            grant_type: None,
            code: None,
            redirect_uri: None,
            client_id: None,
            client_secret: None,
            username: None,
            password: None,
            refresh_token: None,
            scope: None,
            code_verifier: None,
        }
    }
}

/// A validated token request awaiting the host's authorization decision.
/// Transient; never persisted.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// The grant being exercised.
    pub grant_type: GrantType,
    /// The authenticated client.
    pub client: Client,
    /// The consumed authorization code data, for authorization_code.
    pub authorize_data: Option<AuthorizeData>,
    /// The prior token being rotated, for refresh_token.
    pub prior_access: Option<AccessData>,
    /// Generate a refresh token alongside the access token.
    pub generate_refresh: bool,
    /// Lifetime of the access token to issue.
    pub expires_in: Duration,
    /// Scope of the grant.
    pub scope: String,
    /// Redirect URI bound to the grant.
    pub redirect_uri: String,
    /// Resource-owner username, for the password grant. Verification is
    /// the host's concern.
    pub username: String,
    /// Resource-owner password, for the password grant.
    pub password: String,
    /// Set by the host once the grant is approved.
    pub authorized: bool,
    /// Opaque data carried onto the issued token.
    pub user_data: Value,
}

impl AccessRequest {
    /// Marks the request approved.
    pub fn approve(&mut self) {
        self.authorized = true;
    }

    /// Internal bridge for the authorization endpoint's implicit response.
    /// Pre-authorized, refresh generation forced off, no code or refresh
    /// lookups.
    pub(crate) fn implicit(
        client: Client,
        scope: String,
        redirect_uri: String,
        expires_in: Duration,
        user_data: Value,
    ) -> Self {
        Self {
            grant_type: GrantType::Implicit,
            client,
            authorize_data: None,
            prior_access: None,
            generate_refresh: false,
            expires_in,
            scope,
            redirect_uri,
            username: String::new(),
            password: String::new(),
            authorized: true,
            user_data,
        }
    }
}

impl Server {
    /// Validates a token request.
    ///
    /// On success returns an [`AccessRequest`] for the host to approve and
    /// pass to [`finish_access`](Self::finish_access).
    ///
    /// # Errors
    ///
    /// Returns a terminal [`OAuthResponse`] payload, carrying a 401 with a
    /// challenge header when an `Authorization` header was rejected.
    pub async fn access_request(
        &self,
        params: TokenParams,
    ) -> Result<AccessRequest, OAuthResponse> {
        let fail = |error: OAuthError| {
            let mut resp = self.new_response();
            resp.set_error(error, "");
            resp
        };

        if params.method != "POST"
            && !(params.method == "GET" && self.config().allow_get_access_request)
        {
            return Err(fail(OAuthError::invalid_request(
                "token requests must use POST",
            )));
        }

        let raw_grant = params.grant_type.clone().unwrap_or_default();
        let Some(grant_type) = GrantType::from_wire(&raw_grant) else {
            return Err(fail(OAuthError::unsupported_grant_type(&raw_grant)));
        };
        if !self.config().allows_grant_type(grant_type) {
            return Err(fail(OAuthError::unsupported_grant_type(&raw_grant)));
        }

        let credentials = RequestCredentials {
            authorization_header: params.authorization_header.clone(),
            client_id: params.client_id.clone(),
            client_secret: params.client_secret.clone(),
        };
        let client =
            match client_auth::authenticate(self.config(), self.storage(), grant_type, &credentials)
                .await
            {
                Ok(client) => client,
                Err(ClientAuthFailure { error, challenge }) => {
                    let mut resp = self.new_response();
                    if challenge {
                        resp.set_error_with_challenge(error, CHALLENGE_REALM);
                    } else {
                        resp.set_error(error, "");
                    }
                    return Err(resp);
                }
            };

        debug!(client_id = %client.client_id, grant_type = %grant_type, "token request client authenticated");

        match grant_type {
            GrantType::AuthorizationCode => {
                self.validate_code_grant(&params, client).await.map_err(fail)
            }
            GrantType::RefreshToken => {
                self.validate_refresh_grant(&params, client).await.map_err(fail)
            }
            GrantType::Password => {
                let username = params.username.clone().unwrap_or_default();
                let password = params.password.clone().unwrap_or_default();
                if username.is_empty() || password.is_empty() {
                    return Err(fail(OAuthError::invalid_grant(
                        "username and password are required",
                    )));
                }
                Ok(AccessRequest {
                    grant_type,
                    redirect_uri: first_uri(
                        &client.redirect_uri,
                        &self.config().redirect_uri_separator,
                    )
                    .to_string(),
                    client,
                    authorize_data: None,
                    prior_access: None,
                    generate_refresh: true,
                    expires_in: self.config().access_expiration,
                    scope: params.scope.clone().unwrap_or_default(),
                    username,
                    password,
                    authorized: false,
                    user_data: Value::Null,
                })
            }
            GrantType::ClientCredentials => Ok(AccessRequest {
                grant_type,
                redirect_uri: first_uri(
                    &client.redirect_uri,
                    &self.config().redirect_uri_separator,
                )
                .to_string(),
                client,
                authorize_data: None,
                prior_access: None,
                generate_refresh: true,
                expires_in: self.config().access_expiration,
                scope: params.scope.clone().unwrap_or_default(),
                username: String::new(),
                password: String::new(),
                authorized: false,
                user_data: Value::Null,
            }),
            GrantType::Implicit => {
                // Unreachable from the wire; kept total for the enum.
                Err(fail(OAuthError::unsupported_grant_type(&raw_grant)))
            }
        }
    }

    async fn validate_code_grant(
        &self,
        params: &TokenParams,
        client: Client,
    ) -> Result<AccessRequest, OAuthError> {
        let code = params.code.clone().unwrap_or_default();
        if code.is_empty() {
            return Err(OAuthError::invalid_grant("code is required"));
        }

        let authorize_data = self
            .storage()
            .load_authorize(&code)
            .await?
            .ok_or_else(|| OAuthError::invalid_grant("unknown authorization code"))?;
        if authorize_data.is_expired_at(self.now()) {
            return Err(OAuthError::invalid_grant("authorization code expired"));
        }
        if authorize_data.client.client_id != client.client_id {
            return Err(OAuthError::invalid_grant(
                "authorization code belongs to another client",
            ));
        }

        let separator = &self.config().redirect_uri_separator;
        let requested_uri = params.redirect_uri.clone().unwrap_or_default();
        let redirect_uri = if requested_uri.is_empty() {
            first_uri(&client.redirect_uri, separator).to_string()
        } else {
            validate_uri_list(&client.redirect_uri, &requested_uri, separator)?
        };
        if redirect_uri != authorize_data.redirect_uri {
            return Err(OAuthError::invalid_request(
                "redirect_uri does not match the authorization request",
            ));
        }

        if let Some(challenge) = &authorize_data.code_challenge {
            let verifier = params.code_verifier.clone().unwrap_or_default();
            verify_code_challenge(
                challenge,
                authorize_data.code_challenge_method.unwrap_or_default(),
                &verifier,
            )?;
        }

        Ok(AccessRequest {
            grant_type: GrantType::AuthorizationCode,
            client,
            scope: authorize_data.scope.clone(),
            user_data: authorize_data.user_data.clone(),
            authorize_data: Some(authorize_data),
            prior_access: None,
            generate_refresh: true,
            expires_in: self.config().access_expiration,
            redirect_uri,
            username: String::new(),
            password: String::new(),
            authorized: false,
        })
    }

    async fn validate_refresh_grant(
        &self,
        params: &TokenParams,
        client: Client,
    ) -> Result<AccessRequest, OAuthError> {
        let refresh_token = params.refresh_token.clone().unwrap_or_default();
        if refresh_token.is_empty() {
            return Err(OAuthError::invalid_grant("refresh_token is required"));
        }

        let prior = self
            .storage()
            .load_refresh(&refresh_token)
            .await?
            .ok_or_else(|| OAuthError::invalid_grant("unknown refresh token"))?;
        if prior.client.client_id != client.client_id {
            return Err(OAuthError::invalid_client(
                "refresh token belongs to another client",
            ));
        }

        let requested_scope = params.scope.clone().unwrap_or_default();
        let scope = if requested_scope.is_empty() {
            prior.scope.clone()
        } else {
            if let Some(policy) = self.refresh_scope_policy()
                && !policy.allows(&requested_scope, &prior.scope)
            {
                return Err(OAuthError::invalid_scope(
                    "requested scope exceeds the original grant",
                ));
            }
            requested_scope
        };

        Ok(AccessRequest {
            grant_type: GrantType::RefreshToken,
            client,
            authorize_data: None,
            redirect_uri: prior.redirect_uri.clone(),
            user_data: prior.user_data.clone(),
            prior_access: Some(prior),
            generate_refresh: true,
            expires_in: self.config().access_expiration,
            scope,
            username: String::new(),
            password: String::new(),
            authorized: false,
        })
    }

    /// Produces the terminal token response for an approved request.
    pub async fn finish_access(&self, request: AccessRequest) -> OAuthResponse {
        let mut resp = self.new_response();
        self.finish_access_into(&mut resp, request).await;
        resp
    }

    /// Shared finish step, also driven by the authorization endpoint's
    /// implicit bridge.
    pub(crate) async fn finish_access_into(&self, resp: &mut OAuthResponse, request: AccessRequest) {
        if !request.authorized {
            warn!(client_id = %request.client.client_id, grant_type = %request.grant_type, "token request denied");
            resp.set_error(
                OAuthError::access_denied("the request was not authorized"),
                "",
            );
            return;
        }

        let mut data = AccessData {
            client: request.client.clone(),
            authorize_data: request.authorize_data.clone().map(Box::new),
            prior_access: request.prior_access.as_ref().map(|a| Box::new(a.snapshot())),
            access_token: String::new(),
            refresh_token: None,
            created_at: self.now(),
            expires_in: request.expires_in,
            scope: request.scope.clone(),
            redirect_uri: request.redirect_uri.clone(),
            user_data: request.user_data.clone(),
        };

        let tokens = match self
            .token_generator()
            .access_token(&data, request.generate_refresh)
        {
            Ok(tokens) => tokens,
            Err(error) => {
                resp.set_error(error, "");
                return;
            }
        };
        data.access_token = tokens.access_token.clone();
        data.refresh_token = tokens.refresh_token.clone();

        if let Err(error) = self.storage().save_access(data.clone()).await {
            resp.set_error(error, "");
            return;
        }

        // Cleanup failures do not revoke an already-issued grant.
        if let Some(authorize_data) = &request.authorize_data
            && let Err(error) = self.storage().remove_authorize(&authorize_data.code).await
        {
            warn!(%error, "failed to remove consumed authorization code");
        }
        if let Some(prior) = &request.prior_access {
            if let Some(prior_refresh) = &prior.refresh_token
                && let Err(error) = self.storage().remove_refresh(prior_refresh).await
            {
                warn!(%error, "failed to revoke rotated refresh token");
            }
            if let Err(error) = self.storage().remove_access(&prior.access_token).await {
                warn!(%error, "failed to revoke rotated access token");
            }
        }

        resp.set_output("access_token", tokens.access_token);
        resp.set_output("token_type", self.config().token_type.clone());
        resp.set_output("expires_in", data.expires_in.as_secs());
        if let Some(refresh_token) = tokens.refresh_token {
            resp.set_output("refresh_token", refresh_token);
        }
        if !request.scope.is_empty() {
            resp.set_output("scope", request.scope.clone());
        }
    }
}

fn verify_code_challenge(
    challenge: &str,
    method: CodeChallengeMethod,
    verifier: &str,
) -> Result<(), OAuthError> {
    if verifier.is_empty() {
        return Err(OAuthError::invalid_request(
            "code_verifier is required for this authorization code",
        ));
    }
    if verifier.len() < 43
        || verifier.len() > 128
        || !verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'~' | b'.' | b'_' | b'-'))
    {
        return Err(OAuthError::invalid_request(
            "code_verifier must be 43-128 characters from [A-Za-z0-9~._-]",
        ));
    }

    let matches = match method {
        CodeChallengeMethod::Plain => {
            bool::from(challenge.as_bytes().ct_eq(verifier.as_bytes()))
        }
        CodeChallengeMethod::S256 => {
            let derived = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
            bool::from(challenge.as_bytes().ct_eq(derived.as_bytes()))
        }
    };
    if matches {
        Ok(())
    } else {
        Err(OAuthError::invalid_grant(
            "code_verifier does not match the code_challenge",
        ))
    }
}

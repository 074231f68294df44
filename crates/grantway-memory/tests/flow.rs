//! End-to-end grant flows against the memory backend.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde_json::Value;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use url::Url;

use grantway::access::TokenParams;
use grantway::authorize::AuthorizeParams;
use grantway::config::ServerConfig;
use grantway::error::ErrorCode;
use grantway::secret::ClientSecret;
use grantway::server::Server;
use grantway::types::{Client, ClientAuthMethod, GrantType, ResponseType};
use grantway_memory::MemoryStorage;

fn full_config() -> ServerConfig {
    ServerConfig {
        allowed_authorize_types: vec![ResponseType::Code, ResponseType::Token],
        allowed_access_types: vec![
            GrantType::AuthorizationCode,
            GrantType::RefreshToken,
            GrantType::Password,
            GrantType::ClientCredentials,
        ],
        ..ServerConfig::default()
    }
}

fn registered_storage() -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new());
    storage.register_client(
        Client::confidential(
            "1234",
            ClientSecret::Plain("aabbccdd".into()),
            "http://h/appauth",
        )
        .with_auth_method(ClientAuthMethod::None),
    );
    storage
}

fn basic_header(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

fn code_authorize_params() -> AuthorizeParams {
    AuthorizeParams {
        response_type: Some("code".into()),
        client_id: Some("1234".into()),
        state: Some("a".into()),
        ..Default::default()
    }
}

async fn obtain_code(server: &Server) -> String {
    let mut request = server
        .authorize_request(code_authorize_params())
        .await
        .expect("authorize request should validate");
    request.approve(Value::Null);
    let resp = server.finish_authorize(request).await;
    assert!(!resp.is_error(), "consent should issue a code");
    resp.output
        .get("code")
        .and_then(Value::as_str)
        .expect("code present")
        .to_string()
}

#[tokio::test]
async fn authorization_code_flow_end_to_end() {
    let storage = registered_storage();
    let server = Server::new(full_config(), storage);

    // Authorization leg: the redirect carries a generated code and the
    // caller's state.
    let mut request = server
        .authorize_request(code_authorize_params())
        .await
        .unwrap();
    request.approve(Value::Null);
    let resp = server.finish_authorize(request).await;
    let target = Url::parse(&resp.redirect_target().unwrap()).unwrap();
    assert_eq!(target.host_str(), Some("h"));
    assert_eq!(target.path(), "/appauth");
    let code = target
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .expect("code in redirect");
    assert!(!code.is_empty());
    assert!(target.query_pairs().any(|(k, v)| k == "state" && v == "a"));

    // Token leg.
    let params = TokenParams {
        grant_type: Some("authorization_code".into()),
        code: Some(code),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        ..Default::default()
    };
    let mut request = server.access_request(params).await.unwrap();
    request.approve();
    let resp = server.finish_access(request).await;
    assert!(!resp.is_error());
    assert!(
        resp.output
            .get("access_token")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty())
    );
    assert_eq!(
        resp.output.get("token_type").and_then(Value::as_str),
        Some("bearer")
    );
    assert_eq!(
        resp.output.get("expires_in").and_then(Value::as_u64),
        Some(3600)
    );
    assert!(resp.output.get("refresh_token").is_some());
}

#[tokio::test]
async fn authorization_code_is_single_use() {
    let storage = registered_storage();
    let server = Server::new(full_config(), storage.clone());
    let code = obtain_code(&server).await;

    let params = TokenParams {
        grant_type: Some("authorization_code".into()),
        code: Some(code),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        ..Default::default()
    };
    let mut request = server.access_request(params.clone()).await.unwrap();
    request.approve();
    let resp = server.finish_access(request).await;
    assert!(!resp.is_error());
    assert_eq!(storage.authorize_count(), 0);

    let resp = server.access_request(params).await.unwrap_err();
    assert_eq!(resp.error_code, Some(ErrorCode::InvalidGrant));
}

#[tokio::test]
async fn refresh_rotation_revokes_the_prior_pair() {
    let storage = registered_storage();
    let server = Server::new(full_config(), storage.clone());
    let code = obtain_code(&server).await;

    let params = TokenParams {
        grant_type: Some("authorization_code".into()),
        code: Some(code),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        ..Default::default()
    };
    let mut request = server.access_request(params).await.unwrap();
    request.approve();
    let resp = server.finish_access(request).await;
    let old_access = resp.output["access_token"].as_str().unwrap().to_string();
    let old_refresh = resp.output["refresh_token"].as_str().unwrap().to_string();

    let params = TokenParams {
        grant_type: Some("refresh_token".into()),
        refresh_token: Some(old_refresh.clone()),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        ..Default::default()
    };
    let mut request = server.access_request(params.clone()).await.unwrap();
    request.approve();
    let resp = server.finish_access(request).await;
    assert!(!resp.is_error());
    let new_access = resp.output["access_token"].as_str().unwrap().to_string();

    use grantway::storage::Storage;
    assert!(storage.load_access(&old_access).await.unwrap().is_none());
    assert!(storage.load_refresh(&old_refresh).await.unwrap().is_none());
    assert!(storage.load_access(&new_access).await.unwrap().is_some());

    // Redeeming the rotated refresh token again fails.
    let resp = server.access_request(params).await.unwrap_err();
    assert_eq!(resp.error_code, Some(ErrorCode::InvalidGrant));
}

#[tokio::test]
async fn public_client_without_secret_uses_client_credentials() {
    let storage = Arc::new(MemoryStorage::new());
    storage.register_client(Client::public("pub", "http://h/cb"));
    let server = Server::new(full_config(), storage);

    let params = TokenParams {
        grant_type: Some("client_credentials".into()),
        client_id: Some("pub".into()),
        ..Default::default()
    };
    let mut request = server.access_request(params).await.unwrap();
    request.approve();
    let resp = server.finish_access(request).await;
    assert!(!resp.is_error());
    assert!(resp.output.get("access_token").is_some());
}

#[tokio::test]
async fn pkce_challenge_shape_rules() {
    let storage = registered_storage();
    let server = Server::new(full_config(), storage);

    // 43 allowed characters with the method omitted defaults to plain.
    let mut params = code_authorize_params();
    params.code_challenge = Some("a".repeat(43));
    let request = server.authorize_request(params).await.unwrap();
    assert_eq!(
        request.code_challenge_method,
        Some(grantway::types::CodeChallengeMethod::Plain)
    );

    // 10 characters is rejected before consent.
    let mut params = code_authorize_params();
    params.code_challenge = Some("abcdefghij".into());
    let resp = server.authorize_request(params).await.unwrap_err();
    assert_eq!(resp.error_code, Some(ErrorCode::InvalidRequest));
}

#[tokio::test]
async fn pkce_s256_round_trip() {
    let storage = registered_storage();
    let server = Server::new(full_config(), storage);

    let verifier = "correct-horse-battery-staple-correct-horse-battery".to_string();
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

    let mut params = code_authorize_params();
    params.code_challenge = Some(challenge);
    params.code_challenge_method = Some("S256".into());
    let mut request = server.authorize_request(params).await.unwrap();
    request.approve(Value::Null);
    let resp = server.finish_authorize(request).await;
    let code = resp.output["code"].as_str().unwrap().to_string();

    let mut params = TokenParams {
        grant_type: Some("authorization_code".into()),
        code: Some(code),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        ..Default::default()
    };
    let resp = server.access_request(params.clone()).await.unwrap_err();
    assert_eq!(resp.error_code, Some(ErrorCode::InvalidRequest));

    params.code_verifier = Some(verifier);
    let mut request = server.access_request(params).await.unwrap();
    request.approve();
    let resp = server.finish_access(request).await;
    assert!(!resp.is_error());
}

fn issue_time() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid timestamp")
}

fn after_expiry() -> OffsetDateTime {
    issue_time() + Duration::from_secs(300)
}

#[tokio::test]
async fn expired_code_cannot_be_redeemed() {
    let storage = registered_storage();
    let issuing = Server::new(full_config(), storage.clone()).with_clock(issue_time);
    let code = obtain_code(&issuing).await;

    let params = TokenParams {
        grant_type: Some("authorization_code".into()),
        code: Some(code),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        ..Default::default()
    };
    // 250s lifetime: still valid just before, gone just after.
    let late = Server::new(full_config(), storage.clone()).with_clock(after_expiry);
    let resp = late.access_request(params.clone()).await.unwrap_err();
    assert_eq!(resp.error_code, Some(ErrorCode::InvalidGrant));

    assert!(issuing.access_request(params).await.is_ok());
}

#[tokio::test]
async fn info_reports_live_tokens_only() {
    let storage = registered_storage();
    let server = Server::new(full_config(), storage.clone());
    let code = obtain_code(&server).await;

    let params = TokenParams {
        grant_type: Some("authorization_code".into()),
        code: Some(code),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        ..Default::default()
    };
    let mut request = server.access_request(params).await.unwrap();
    request.approve();
    let resp = server.finish_access(request).await;
    let access_token = resp.output["access_token"].as_str().unwrap().to_string();

    let info = server
        .info_request(grantway::info::InfoParams {
            authorization_header: Some(format!("Bearer {access_token}")),
            ..Default::default()
        })
        .await;
    assert!(!info.is_error());
    assert_eq!(
        info.output.get("access_token").and_then(Value::as_str),
        Some(access_token.as_str())
    );

    let info = server
        .info_request(grantway::info::InfoParams {
            authorization_header: Some("Bearer unknown".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(info.error_code, Some(ErrorCode::InvalidGrant));
}

#[tokio::test]
async fn password_grant_carries_credentials_to_the_host() {
    let storage = registered_storage();
    let server = Server::new(full_config(), storage);

    let params = TokenParams {
        grant_type: Some("password".into()),
        authorization_header: Some(basic_header("1234", "aabbccdd")),
        username: Some("alice".into()),
        password: Some("hunter2".into()),
        scope: Some("everything".into()),
        ..Default::default()
    };
    let mut request = server.access_request(params).await.unwrap();
    assert_eq!(request.username, "alice");
    assert_eq!(request.password, "hunter2");

    // The host verifies the password; the engine only issues.
    request.approve();
    let resp = server.finish_access(request).await;
    assert!(!resp.is_error());
    assert_eq!(
        resp.output.get("scope").and_then(Value::as_str),
        Some("everything")
    );
}

//! Engine output for the response emitter.
//!
//! Handlers never touch the transport. They produce an [`OAuthResponse`]
//! carrying everything the host needs to emit a JSON payload or a
//! redirect: output key/value pairs, headers, status code, the redirect
//! target with its query-vs-fragment flag, and the OAuth error code when
//! the request was denied. Internal causes stay on the response for
//! server-side logging and are never part of the wire output.

use serde_json::{Map, Value};
use url::Url;

use crate::OAuthResult;
use crate::error::{ErrorCode, OAuthError};

/// How the response is delivered to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Direct payload (token endpoint).
    Data,
    /// Redirect to the client's validated URI (authorization endpoint).
    Redirect,
}

/// Result of handling an authorization or token request.
#[derive(Debug)]
pub struct OAuthResponse {
    /// Payload or redirect.
    pub kind: ResponseKind,

    /// HTTP status code the emitter should use.
    pub status_code: u16,

    /// Wire output. For redirects these become the query or fragment
    /// parameters of the target URL.
    pub output: Map<String, Value>,

    /// Headers the emitter should set.
    pub headers: Vec<(String, String)>,

    /// Validated redirect target, for `ResponseKind::Redirect`.
    pub redirect_url: Option<String>,

    /// Deliver redirect output in the URL fragment instead of the query.
    pub fragment: bool,

    /// OAuth error code when the request was denied.
    pub error_code: Option<ErrorCode>,

    /// Full denial cause, retained server-side only.
    pub internal_cause: Option<OAuthError>,

    error_status_code: u16,
}

impl OAuthResponse {
    /// Creates an empty data response. Denials will use the given status
    /// code unless a challenge upgrades them to 401.
    #[must_use]
    pub fn new(error_status_code: u16) -> Self {
        Self {
            kind: ResponseKind::Data,
            status_code: 200,
            output: Map::new(),
            headers: vec![
                ("Cache-Control".to_string(), "no-store".to_string()),
                ("Pragma".to_string(), "no-cache".to_string()),
            ],
            redirect_url: None,
            fragment: false,
            error_code: None,
            internal_cause: None,
            error_status_code,
        }
    }

    /// Returns `true` if the response carries a denial.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }

    /// Adds an output value.
    pub fn set_output(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.output.insert(key.into(), value.into());
    }

    /// Turns the response into a denial.
    ///
    /// The wire output carries only the RFC error code and its default
    /// description; the full cause is retained server-side in
    /// `internal_cause`. A previously set redirect target is kept so
    /// authorization-endpoint errors still travel to the validated URI,
    /// with `state` echoed when non-empty.
    pub fn set_error(&mut self, error: OAuthError, state: &str) {
        let code = error.oauth_error_code();
        self.output.clear();
        self.output
            .insert("error".to_string(), Value::String(code.as_str().to_string()));
        self.output.insert(
            "error_description".to_string(),
            Value::String(code.default_description().to_string()),
        );
        if !state.is_empty() {
            self.output
                .insert("state".to_string(), Value::String(state.to_string()));
        }
        self.status_code = self.error_status_code;
        self.error_code = Some(code);
        self.internal_cause = Some(error);
    }

    /// Turns the response into a denial that must carry a 401 challenge,
    /// used when an Authorization header was present but rejected.
    pub fn set_error_with_challenge(&mut self, error: OAuthError, realm: &str) {
        self.set_error(error, "");
        self.status_code = 401;
        self.headers.push((
            "WWW-Authenticate".to_string(),
            format!("Basic realm=\"{realm}\""),
        ));
    }

    /// Makes this a redirect response to the given validated URI.
    pub fn set_redirect(&mut self, url: impl Into<String>) {
        self.kind = ResponseKind::Redirect;
        self.redirect_url = Some(url.into());
    }

    /// Selects fragment encoding for the redirect output.
    pub fn set_redirect_fragment(&mut self, fragment: bool) {
        self.fragment = fragment;
    }

    /// Builds the final redirect URL with the output encoded into the
    /// query string or, for implicit responses, the fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the response is not a redirect or the target
    /// fails to parse.
    pub fn redirect_target(&self) -> OAuthResult<String> {
        let Some(raw) = self.redirect_url.as_deref() else {
            return Err(OAuthError::internal("response is not a redirect"));
        };
        let mut url = Url::parse(raw)
            .map_err(|e| OAuthError::internal(format!("redirect target is invalid: {e}")))?;

        let pairs: Vec<(&str, String)> = self
            .output
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.as_str(), text)
            })
            .collect();

        if self.fragment {
            let mut encoded = url::form_urlencoded::Serializer::new(String::new());
            encoded.extend_pairs(pairs.iter().map(|(k, v)| (k, v.as_str())));
            url.set_fragment(Some(&encoded.finish()));
        } else {
            let mut query = url.query_pairs_mut();
            for (k, v) in &pairs {
                query.append_pair(k, v);
            }
            drop(query);
        }
        Ok(url.to_string())
    }
}

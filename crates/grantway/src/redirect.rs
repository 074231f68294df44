//! Redirect URI validation.
//!
//! A client's registered URI set is the sole authority for where an
//! authorization response may be delivered. Validation is strict:
//!
//! - fragments are rejected in both the registered and the requested URI
//! - schemes must match exactly
//! - hosts must match exactly, except that two loopback literals match
//!   regardless of port (the RFC 8252 native-app carve-out)
//! - the requested path must equal the registered path or be a strict
//!   sub-path of it, checked after URL parsing has resolved `.` and `..`
//!   segments so traversal cannot escape the registered prefix
//!
//! The requested URI's query string is preserved in the normalized result.

use url::{Host, Url};

use crate::OAuthResult;
use crate::error::OAuthError;

/// Validates a requested redirect URI against a single registered base URI.
///
/// Returns the normalized requested URI on success.
///
/// # Errors
///
/// Returns `invalid_request` if either URI fails to parse, carries a
/// fragment, or the scheme/host/path rules are violated.
pub fn validate_uri(base: &str, candidate: &str) -> OAuthResult<String> {
    if base.is_empty() {
        return Err(OAuthError::invalid_request("registered redirect URI is empty"));
    }
    if candidate.is_empty() {
        return Err(OAuthError::invalid_request("redirect URI is empty"));
    }

    let base_url = Url::parse(base)
        .map_err(|e| OAuthError::invalid_request(format!("registered redirect URI is invalid: {e}")))?;
    let candidate_url = Url::parse(candidate)
        .map_err(|e| OAuthError::invalid_request(format!("redirect URI is invalid: {e}")))?;

    if base_url.fragment().is_some() || candidate_url.fragment().is_some() {
        return Err(OAuthError::invalid_request(
            "redirect URI must not contain a fragment",
        ));
    }

    if base_url.scheme() != candidate_url.scheme() {
        return Err(OAuthError::invalid_request(format!(
            "redirect URI scheme mismatch: expected {}, got {}",
            base_url.scheme(),
            candidate_url.scheme()
        )));
    }

    if !hosts_match(&base_url, &candidate_url) {
        return Err(OAuthError::invalid_request(format!(
            "redirect URI host mismatch: {candidate} does not match {base}"
        )));
    }

    // Url::parse already resolved "." and ".." segments, so a prefix check
    // on the parsed path cannot be defeated by traversal.
    let base_path = base_url.path();
    let candidate_path = candidate_url.path();
    let prefix = format!("{}/", base_path.trim_end_matches('/'));
    if candidate_path != base_path && !candidate_path.starts_with(&prefix) {
        return Err(OAuthError::invalid_request(format!(
            "redirect URI path mismatch: {candidate_path} is not {base_path} or below it"
        )));
    }

    Ok(candidate_url.to_string())
}

/// Validates a requested redirect URI against a registered URI list.
///
/// When `separator` is non-empty, `base_list` is split on it and each
/// member is tried in order; the first success wins.
///
/// # Errors
///
/// Returns `invalid_request` when no registered URI accepts the candidate.
pub fn validate_uri_list(base_list: &str, candidate: &str, separator: &str) -> OAuthResult<String> {
    if separator.is_empty() {
        return validate_uri(base_list, candidate);
    }
    for base in base_list.split(separator) {
        if let Ok(normalized) = validate_uri(base, candidate) {
            return Ok(normalized);
        }
    }
    Err(OAuthError::invalid_request(format!(
        "redirect URI {candidate} does not match any registered URI"
    )))
}

/// Returns a client's default redirect URI: the first member of its
/// registered list.
#[must_use]
pub fn first_uri<'a>(base_list: &'a str, separator: &str) -> &'a str {
    if separator.is_empty() {
        return base_list;
    }
    base_list.split(separator).next().unwrap_or(base_list)
}

fn hosts_match(base: &Url, candidate: &Url) -> bool {
    if is_loopback(base) && is_loopback(candidate) {
        // Native apps bind an ephemeral loopback port; any port matches.
        return true;
    }
    base.host_str() == candidate.host_str()
        && base.port_or_known_default() == candidate.port_or_known_default()
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        _ => false,
    }
}

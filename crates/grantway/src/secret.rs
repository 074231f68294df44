//! Client secret storage and verification strategies.
//!
//! A [`ClientSecret`] is the stored representation of a client credential.
//! The engine never extracts a plain secret for comparison; every check goes
//! through [`ClientSecret::verify`], which compares in constant time for the
//! plain strategy and re-derives an Argon2id hash for the salted-hash
//! strategy. Callers with secrets the engine cannot read (an HSM, a legacy
//! digest scheme) can plug in an opaque [`SecretMatcher`].

use std::fmt;
use std::sync::Arc;

use argon2::{
    Argon2, Params,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::OAuthResult;
use crate::error::OAuthError;

/// Verification against an opaque secret representation.
///
/// Implementations decide how the candidate is compared; the engine only
/// sees the boolean outcome, so the stored secret never has to leave the
/// caller's custody.
pub trait SecretMatcher: Send + Sync {
    /// Returns `true` if the candidate matches the stored secret.
    fn matches(&self, candidate: &str) -> bool;
}

/// Stored representation of a client secret.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientSecret {
    /// No secret registered (public clients).
    #[default]
    None,

    /// Plain stored credential, compared in constant time.
    Plain(String),

    /// Argon2id PHC string. Salt, algorithm version and cost parameters are
    /// all encoded in the string, so verification is deterministic without
    /// any global configuration.
    Hashed(String),

    /// Caller-supplied matcher over an opaque representation.
    #[serde(skip)]
    Opaque(Arc<dyn SecretMatcher>),
}

impl ClientSecret {
    /// Hashes a plain secret into the salted-hash representation using the
    /// default Argon2id parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hashed(secret: &str) -> OAuthResult<Self> {
        Self::hashed_with_params(secret, Params::default())
    }

    /// Hashes a plain secret with explicit Argon2id cost parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hashed_with_params(secret: &str, params: Params) -> OAuthResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| OAuthError::internal(format!("secret hashing failed: {e}")))?;
        Ok(Self::Hashed(hash.to_string()))
    }

    /// Verifies a candidate secret against the stored representation.
    ///
    /// An empty stored secret matches only an empty candidate.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored hash cannot be parsed. A mismatch is
    /// `Ok(false)`, never an error.
    pub fn verify(&self, candidate: &str) -> OAuthResult<bool> {
        match self {
            Self::None => Ok(candidate.is_empty()),
            Self::Plain(stored) => {
                Ok(stored.as_bytes().ct_eq(candidate.as_bytes()).into())
            }
            Self::Hashed(phc) => {
                let parsed = PasswordHash::new(phc).map_err(|e| {
                    OAuthError::internal(format!("stored secret hash is malformed: {e}"))
                })?;
                Ok(Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok())
            }
            Self::Opaque(matcher) => Ok(matcher.matches(candidate)),
        }
    }

    /// Returns `true` if no usable secret is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Plain(s) => s.is_empty(),
            Self::Hashed(_) | Self::Opaque(_) => false,
        }
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material.
        match self {
            Self::None => write!(f, "ClientSecret::None"),
            Self::Plain(_) => write!(f, "ClientSecret::Plain(***)"),
            Self::Hashed(_) => write!(f, "ClientSecret::Hashed(***)"),
            Self::Opaque(_) => write!(f, "ClientSecret::Opaque(..)"),
        }
    }
}

/// Generates a new random client secret.
///
/// 256 bits from a CSPRNG, hex-encoded.
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_matches_only_empty() {
        let secret = ClientSecret::None;
        assert!(secret.verify("").unwrap());
        assert!(!secret.verify("anything").unwrap());
        assert!(secret.is_empty());
    }

    #[test]
    fn test_plain_verify() {
        let secret = ClientSecret::Plain("aabbccdd".into());
        assert!(secret.verify("aabbccdd").unwrap());
        assert!(!secret.verify("aabbccde").unwrap());
        assert!(!secret.verify("").unwrap());
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_hashed_verify() {
        let secret = ClientSecret::hashed("s3cret").unwrap();
        match &secret {
            ClientSecret::Hashed(phc) => assert!(phc.starts_with("$argon2id$")),
            other => panic!("expected hashed secret, got {other:?}"),
        }
        assert!(secret.verify("s3cret").unwrap());
        assert!(!secret.verify("wrong").unwrap());
    }

    #[test]
    fn test_hashed_same_secret_different_salt() {
        let a = ClientSecret::hashed("dup").unwrap();
        let b = ClientSecret::hashed("dup").unwrap();
        let (ClientSecret::Hashed(pa), ClientSecret::Hashed(pb)) = (&a, &b) else {
            panic!("expected hashed secrets");
        };
        assert_ne!(pa, pb);
        assert!(a.verify("dup").unwrap());
        assert!(b.verify("dup").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let secret = ClientSecret::Hashed("not-a-phc-string".into());
        assert!(secret.verify("whatever").is_err());
    }

    #[test]
    fn test_opaque_matcher() {
        struct Fixed;
        impl SecretMatcher for Fixed {
            fn matches(&self, candidate: &str) -> bool {
                candidate == "letmein"
            }
        }
        let secret = ClientSecret::Opaque(Arc::new(Fixed));
        assert!(secret.verify("letmein").unwrap());
        assert!(!secret.verify("other").unwrap());
        assert!(!secret.is_empty());
    }

    #[test]
    fn test_generate_client_secret() {
        let a = generate_client_secret();
        let b = generate_client_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(hex::decode(&a).is_ok());
    }

    #[test]
    fn test_debug_redacts() {
        let dbg = format!("{:?}", ClientSecret::Plain("topsecret".into()));
        assert!(!dbg.contains("topsecret"));
    }
}

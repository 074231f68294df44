//! id_token signing abstraction.
//!
//! The concrete JOSE library is a deployment concern. The engine only
//! decides which JWS algorithm a key demands and hands the claims to an
//! [`IdTokenSigner`] supplied by [`Storage`](crate::storage::Storage).

use serde_json::Value;

use crate::OAuthResult;
use crate::error::OAuthError;

/// Kind of key material backing a signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningKeyKind {
    /// RSA key of any supported size.
    Rsa,
    /// ECDSA over NIST P-256.
    EcP256,
    /// ECDSA over NIST P-384.
    EcP384,
    /// ECDSA over NIST P-521.
    EcP521,
    /// Anything else. No algorithm is selected; signing fails hard.
    Other(String),
}

/// JWS algorithms the engine will request from a signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256,
    /// ECDSA P-256 with SHA-256.
    Es256,
    /// ECDSA P-384 with SHA-384.
    Es384,
    /// ECDSA P-521 with SHA-512.
    Es512,
}

impl SigningAlgorithm {
    /// Returns the JOSE `alg` header value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
            Self::Es512 => "ES512",
        }
    }
}

/// Selects the signing algorithm a key kind mandates.
///
/// # Errors
///
/// Returns a signing error for key kinds with no supported algorithm.
pub fn algorithm_for_key(kind: &SigningKeyKind) -> OAuthResult<SigningAlgorithm> {
    match kind {
        SigningKeyKind::Rsa => Ok(SigningAlgorithm::Rs256),
        SigningKeyKind::EcP256 => Ok(SigningAlgorithm::Es256),
        SigningKeyKind::EcP384 => Ok(SigningAlgorithm::Es384),
        SigningKeyKind::EcP521 => Ok(SigningAlgorithm::Es512),
        SigningKeyKind::Other(name) => Err(OAuthError::signing(format!(
            "no signing algorithm for key type {name}"
        ))),
    }
}

/// Signs id_token claims with a deployment-supplied key.
pub trait IdTokenSigner: Send + Sync {
    /// Kind of the backing key, used for algorithm selection.
    fn key_kind(&self) -> SigningKeyKind;

    /// Signs the claims into a compact JWS.
    ///
    /// # Errors
    ///
    /// Returns a signing error if the operation fails.
    fn sign(&self, algorithm: SigningAlgorithm, claims: &Value) -> OAuthResult<String>;
}

//! Domain types for the authorization engine.
//!
//! - [`client`] - OAuth client registrations and flow enums
//! - [`authorize`] - authorization code data
//! - [`access`] - access/refresh token data

pub mod access;
pub mod authorize;
pub mod client;

pub use access::AccessData;
pub use authorize::{AuthorizeData, CodeChallengeMethod};
pub use client::{Client, ClientAuthMethod, ClientType, GrantType, ResponseType};

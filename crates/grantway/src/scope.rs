//! Opaque scope helpers.
//!
//! Scopes are space-separated opaque strings; the engine only ever checks
//! equality and membership, never meaning.

/// Returns `true` if the space-separated `scope` contains `needle`.
#[must_use]
pub fn scope_contains(scope: &str, needle: &str) -> bool {
    scope.split(' ').filter(|s| !s.is_empty()).any(|s| s == needle)
}

/// Returns `true` if every element of `requested` appears in `granted`.
#[must_use]
pub fn is_subset(requested: &str, granted: &str) -> bool {
    requested
        .split(' ')
        .filter(|s| !s.is_empty())
        .all(|s| scope_contains(granted, s))
}

/// Policy applied when a refresh request supplies a scope override.
///
/// The engine does not narrow scopes by default; install a policy on the
/// server to reject overrides that escape the original grant.
pub trait RefreshScopePolicy: Send + Sync {
    /// Returns `true` if `requested` is acceptable given the originally
    /// granted scope.
    fn allows(&self, requested: &str, granted: &str) -> bool;
}

/// Requires the requested scope to be a subset of the original grant.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsetScopePolicy;

impl RefreshScopePolicy for SubsetScopePolicy {
    fn allows(&self, requested: &str, granted: &str) -> bool {
        is_subset(requested, granted)
    }
}

//! Identity seam.
//!
//! Authentication happens upstream of this service. An `IdentityProvider`
//! only turns an inbound request into the verified identity that upstream
//! attached to it, or into nothing for an unauthenticated request.

use axum::http::{HeaderMap, HeaderName};
use track_votes_shared::types::UserIdentity;

pub trait IdentityProvider: Send + Sync {
    /// Returns the verified identity carried by the request headers, if any.
    fn identify(&self, headers: &HeaderMap) -> Option<UserIdentity>;
}

/// Trusts a single header set by the authenticating proxy.
#[derive(Debug, Clone)]
pub struct HeaderIdentityProvider {
    header: HeaderName,
}

impl HeaderIdentityProvider {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn identify(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let email = headers.get(&self.header)?.to_str().ok()?.trim();
        if email.is_empty() {
            return None;
        }
        Some(UserIdentity::new(email))
    }
}

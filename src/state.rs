/*
 * Responsibility
 * - Shared context of the demo routes (AppState)
 * - Clone is cheap: the denylist shares its cache handle
 */
use crate::services::cache::CacheBackend;
use crate::services::revocation::CacheDenylist;

/// Field the middleware stores the raw token under, read by the revoke route.
pub const TOKEN_KEY: &str = "token";

pub type Denylist = CacheDenylist<CacheBackend>;

#[derive(Clone, Debug)]
pub struct AppState {
    pub denylist: Denylist,
    pub claims_key: String,
}

impl AppState {
    pub fn new(denylist: Denylist, claims_key: impl Into<String>) -> Self {
        Self {
            denylist,
            claims_key: claims_key.into(),
        }
    }
}

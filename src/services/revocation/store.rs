use std::{future::Future, pin::Pin};

use axum::http::request::Parts;

use crate::identity::Claims;
use crate::services::cache::CacheError;

/// Revocation check result:
/// - `Ok(false)`: token is still valid
/// - `Ok(true)`: token was revoked
/// - `Err(_)`: the check itself failed (treated as revoked, fail-closed)
pub trait RevocationCheck: Send + Sync {
    // Called only after the signature and claims have been verified.
    //
    // `parts` is the request head; the body is not available here.
    fn is_revoked<'a>(
        &'a self,
        parts: &'a Parts,
        token: &'a str,
        claims: &'a Claims,
    ) -> Pin<Box<dyn Future<Output = Result<bool, RevocationError>> + Send + 'a>>;
}

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    /// Checker-specific refusal; the message is shown in debug mode.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl RevocationError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

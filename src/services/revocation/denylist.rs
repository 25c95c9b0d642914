use std::{future::Future, pin::Pin, time::Duration};

use axum::http::request::Parts;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::identity::Claims;
use crate::services::cache::{CacheClient, MemoryCache, ValkeyClient};
use crate::services::revocation::store::{RevocationCheck, RevocationError};

const DEFAULT_PREFIX: &str = "jwt:revoked";
// Tokens without `exp` stay denied this long.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
// Upper bound for far-future `exp`; stays within what Valkey accepts for PX.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Denylist of revoked tokens on top of a [`CacheClient`].
///
/// - Entry key: `<prefix>:<jti>`, or `<prefix>:sha256:<base64url(sha256(token))>`
///   when the token has no `jti`.
/// - Entries expire together with the token (`exp`), so the list never grows
///   past the set of still-valid tokens.
/// - Backend failures are returned as `Err`; the middleware rejects (fail-closed).
#[derive(Clone, Debug)]
pub struct CacheDenylist<C: CacheClient> {
    cache: C,
    prefix: String,
    default_ttl: Duration,
}

impl CacheDenylist<ValkeyClient> {
    pub async fn connect(redis_url: &str) -> Result<Self, RevocationError> {
        let client = ValkeyClient::new(redis_url).await?;
        Ok(Self::new(client))
    }
}

impl CacheDenylist<MemoryCache> {
    pub fn in_memory() -> Self {
        Self::new(MemoryCache::new())
    }
}

impl<C: CacheClient> CacheDenylist<C> {
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn key(&self, token: &str, claims: &Claims) -> String {
        match claims.jti() {
            Some(jti) if !jti.is_empty() => format!("{}:{}", self.prefix, jti),
            _ => {
                let digest = Sha256::digest(token.as_bytes());
                format!("{}:sha256:{}", self.prefix, URL_SAFE_NO_PAD.encode(digest))
            }
        }
    }

    /// Remaining lifetime of the token, `None` if it already expired.
    fn ttl_for(&self, claims: &Claims) -> Option<Duration> {
        let Some(exp) = claims.exp() else {
            return Some(self.default_ttl);
        };
        let remaining = (exp - Utc::now().timestamp() as f64).ceil();
        if remaining <= 0.0 {
            return None;
        }
        Some(Duration::try_from_secs_f64(remaining).map_or(MAX_TTL, |ttl| ttl.min(MAX_TTL)))
    }

    /// Deny `token` from now on.
    ///
    /// Returns `Ok(true)` when newly revoked, `Ok(false)` when it was already
    /// revoked or has expired anyway.
    pub async fn revoke(&self, token: &str, claims: &Claims) -> Result<bool, RevocationError> {
        let Some(ttl) = self.ttl_for(claims) else {
            return Ok(false);
        };

        let key = self.key(token, claims);
        let revoked_at = Utc::now().to_rfc3339();
        let inserted = self.cache.insert_if_absent(&key, &revoked_at, ttl).await?;

        tracing::info!(
            backend = self.cache.backend_name(),
            ttl_secs = ttl.as_secs(),
            newly_revoked = inserted,
            "token revoked"
        );
        Ok(inserted)
    }

    /// Lift a revocation. Returns whether an entry was removed.
    pub async fn restore(&self, token: &str, claims: &Claims) -> Result<bool, RevocationError> {
        Ok(self.cache.remove(&self.key(token, claims)).await?)
    }

    pub async fn contains(&self, token: &str, claims: &Claims) -> Result<bool, RevocationError> {
        Ok(self.cache.exists(&self.key(token, claims)).await?)
    }

    /// When the token was revoked, if it is.
    pub async fn revoked_at(
        &self,
        token: &str,
        claims: &Claims,
    ) -> Result<Option<DateTime<Utc>>, RevocationError> {
        let entry = self.cache.get(&self.key(token, claims)).await?;
        Ok(entry
            .and_then(|at| DateTime::parse_from_rfc3339(&at).ok())
            .map(|at| at.with_timezone(&Utc)))
    }
}

impl<C: CacheClient> RevocationCheck for CacheDenylist<C> {
    fn is_revoked<'a>(
        &'a self,
        _parts: &'a Parts,
        token: &'a str,
        claims: &'a Claims,
    ) -> Pin<Box<dyn Future<Output = Result<bool, RevocationError>> + Send + 'a>> {
        Box::pin(self.contains(token, claims))
    }
}

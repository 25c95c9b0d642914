/*
 * Responsibility
 * - Configuration surface of the JWT middleware (JwtAuthBuilder)
 * - Immutable after build(); shared between requests behind an Arc
 */
use std::sync::Arc;

use jsonwebtoken::Algorithm;

use crate::identity::DEFAULT_CLAIMS_KEY;
use crate::middleware::auth::locator::{TokenLocator, TokenSource};
use crate::services::revocation::RevocationCheck;
use crate::services::verifier::{JsonWebTokenVerifier, Secret, TokenVerifier, VerifyOptions};

/// JWT authentication middleware.
///
/// Cheap to clone; the configuration is shared and read-only.
///
/// ```ignore
/// let auth = JwtAuth::builder()
///     .secret(Secret::shared("shhhhhh"))
///     .cookie("jwt")
///     .build();
/// let router = middleware::apply(router, auth.unless(Exclusions::new().path("/health")));
/// ```
#[derive(Clone)]
pub struct JwtAuth {
    pub(super) inner: Arc<JwtAuthInner>,
}

pub(super) struct JwtAuthInner {
    pub(super) secret: Option<Secret>,
    pub(super) locator: TokenLocator,
    pub(super) key: String,
    pub(super) token_key: Option<String>,
    pub(super) options: VerifyOptions,
    pub(super) passthrough: bool,
    pub(super) debug: bool,
    pub(super) revocation: Option<Arc<dyn RevocationCheck>>,
    pub(super) verifier: Arc<dyn TokenVerifier>,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = &self.inner;
        f.debug_struct("JwtAuth")
            .field("secret", &inner.secret)
            .field("cookie", &inner.locator.cookie)
            .field("custom_locator", &inner.locator.source.is_some())
            .field("key", &inner.key)
            .field("token_key", &inner.token_key)
            .field("options", &inner.options)
            .field("passthrough", &inner.passthrough)
            .field("debug", &inner.debug)
            .field("revocation", &inner.revocation.is_some())
            .finish()
    }
}

impl JwtAuth {
    pub fn builder() -> JwtAuthBuilder {
        JwtAuthBuilder::default()
    }

    /// Middleware verifying with a static secret and default settings.
    pub fn new(secret: Secret) -> Self {
        Self::builder().secret(secret).build()
    }
}

pub struct JwtAuthBuilder {
    secret: Option<Secret>,
    locator: TokenLocator,
    key: String,
    token_key: Option<String>,
    options: VerifyOptions,
    passthrough: bool,
    debug: bool,
    revocation: Option<Arc<dyn RevocationCheck>>,
    verifier: Arc<dyn TokenVerifier>,
}

impl Default for JwtAuthBuilder {
    fn default() -> Self {
        Self {
            secret: None,
            locator: TokenLocator::default(),
            key: DEFAULT_CLAIMS_KEY.to_string(),
            token_key: None,
            options: VerifyOptions::default(),
            passthrough: false,
            debug: false,
            revocation: None,
            verifier: Arc::new(JsonWebTokenVerifier),
        }
    }
}

impl JwtAuthBuilder {
    /// Static verification key. A secret set in the request state overrides it.
    pub fn secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Field name the claims are stored under (default `user`).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Also store the raw token under this field name.
    pub fn token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = Some(key.into());
        self
    }

    /// Read the token from this cookie before looking at the Authorization header.
    pub fn cookie(mut self, name: impl Into<String>) -> Self {
        self.locator.cookie = Some(name.into());
        self
    }

    /// Custom token source, consulted first.
    pub fn get_token(mut self, source: impl TokenSource + 'static) -> Self {
        self.locator.source = Some(Arc::new(source));
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.options.audience.push(audience.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.options.issuer.push(issuer.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.options.subject = Some(subject.into());
        self
    }

    pub fn algorithms(mut self, algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        self.options.algorithms = algorithms.into_iter().collect();
        self
    }

    pub fn leeway(mut self, seconds: u64) -> Self {
        self.options.leeway = seconds;
        self
    }

    pub fn ignore_expiration(mut self, ignore: bool) -> Self {
        self.options.ignore_expiration = ignore;
        self
    }

    /// Let failed requests continue without claims instead of answering 401.
    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    /// Echo verifier / revocation details in the 401 body.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_revoked(mut self, check: impl RevocationCheck + 'static) -> Self {
        self.revocation = Some(Arc::new(check));
        self
    }

    /// Same as [`Self::is_revoked`] for an already shared checker.
    pub fn revocation(mut self, check: Arc<dyn RevocationCheck>) -> Self {
        self.revocation = Some(check);
        self
    }

    pub fn verifier(mut self, verifier: impl TokenVerifier + 'static) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    pub fn build(self) -> JwtAuth {
        JwtAuth {
            inner: Arc::new(JwtAuthInner {
                secret: self.secret,
                locator: self.locator,
                key: self.key,
                token_key: self.token_key,
                options: self.options,
                passthrough: self.passthrough,
                debug: self.debug,
                revocation: self.revocation,
                verifier: self.verifier,
            }),
        }
    }
}

//! JWT verification -> RequestState in extensions
//!
//! Per request:
//! locate token -> resolve secret -> verify -> revocation check -> attach claims.
//!
//! Every failure ends as a 401 (or the custom locator's own status), except
//! under `passthrough` where the request continues without claims.

use axum::{
    body::Body,
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AuthError;
use crate::identity::{Claims, RequestState};
use crate::middleware::Middleware;
use crate::middleware::auth::{options::JwtAuth, secret};

/// Outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct Verified {
    pub token: String,
    pub claims: Claims,
}

impl JwtAuth {
    /// Run the authentication pipeline against a request head.
    ///
    /// Does not touch the request; [`Middleware::handle`] stores the result.
    pub async fn authenticate(&self, parts: &Parts) -> Result<Verified, AuthError> {
        let inner = &self.inner;

        let token = inner
            .locator
            .locate(parts)?
            .ok_or(AuthError::BadHeaderFormat)?;

        let secret = secret::resolve(&parts.extensions, inner.secret.as_ref())?;

        let claims = inner
            .verifier
            .verify(&token, secret, &inner.options)
            .await
            .map_err(|err| AuthError::verification(err.detail()))?;

        if let Some(check) = &inner.revocation {
            match check.is_revoked(parts, &token, &claims).await {
                Ok(false) => {}
                Ok(true) => return Err(AuthError::Revoked),
                Err(err) => return Err(AuthError::revocation_failure(err.to_string())),
            }
        }

        Ok(Verified { token, claims })
    }
}

impl Middleware for JwtAuth {
    async fn handle(&self, req: Request<Body>, next: Next) -> Response {
        let (mut parts, body) = req.into_parts();

        let outcome = self.authenticate(&parts).await;
        match outcome {
            Ok(Verified { token, claims }) => {
                let state = RequestState::of_mut(&mut parts.extensions);
                state.authenticate(&self.inner.key, claims);
                if let Some(token_key) = &self.inner.token_key {
                    state.set_token(token_key, token);
                }
                tracing::debug!(key = %self.inner.key, "request authenticated");
            }
            Err(err) if self.inner.passthrough && err.is_absorbable() => {
                tracing::debug!(error = %err, "authentication failed, passing through");
                RequestState::of_mut(&mut parts.extensions).reject(err);
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    method = %parts.method,
                    path = %parts.uri.path(),
                    "authentication rejected"
                );
                return err.into_response_with(self.inner.debug);
            }
        }

        // middleware -> handler hand-off
        next.run(Request::from_parts(parts, body)).await
    }
}

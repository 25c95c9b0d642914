use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use super::{Claims, RequestState};

/// Handler-side access to the claims stored under the default key (`user`).
///
/// The auth middleware must have run before; when no claims are present
/// (middleware missing, excluded route, passthrough) the extractor answers 401.
pub struct Identity(pub Claims);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        RequestState::of(&parts.extensions)
            .and_then(RequestState::user)
            .cloned()
            .map(Identity)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Like [`Identity`] but never rejects; for passthrough and excluded routes.
pub struct MaybeIdentity(pub Option<Claims>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(
            RequestState::of(&parts.extensions)
                .and_then(RequestState::user)
                .cloned(),
        ))
    }
}

/// The whole request state; empty when the middleware did not run.
///
/// Use this when claims are stored under a custom key or the raw token is
/// needed.
impl<S> FromRequestParts<S> for RequestState
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestState::of(&parts.extensions)
            .cloned()
            .unwrap_or_default())
    }
}

use axum::http::Extensions;

use crate::error::AuthError;
use crate::identity::RequestState;
use crate::services::verifier::Secret;

/// Pick the verification key for a request.
///
/// A secret placed in [`RequestState`] by an earlier stage always wins over
/// the configured one, even when both are present.
pub fn resolve<'a>(
    extensions: &'a Extensions,
    configured: Option<&'a Secret>,
) -> Result<&'a Secret, AuthError> {
    RequestState::of(extensions)
        .and_then(RequestState::secret)
        .or(configured)
        .ok_or(AuthError::NoSecret)
}

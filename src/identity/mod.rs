/*!
 * Authenticated identity as seen by downstream handlers
 *
 * Responsibility:
 * - Types written by the middleware into request extensions (types)
 * - Extractors reading them back in handlers (core)
 *
 * Public API:
 * - Claims, RequestState, AuthStatus
 * - Identity, MaybeIdentity
 */

mod core;
mod types;

pub use self::core::{Identity, MaybeIdentity};
pub use types::{AuthStatus, Claims, DEFAULT_CLAIMS_KEY, RequestState};

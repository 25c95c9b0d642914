//! JWT bearer authentication middleware for axum.
//!
//! A request goes through: token location (custom source, cookie, then
//! `Authorization: Bearer`), secret resolution, signature and claim
//! verification, and an optional async revocation check. Verified claims are
//! stored in [`identity::RequestState`] for downstream handlers; every failure
//! ends as a plain-text 401 unless `passthrough` is enabled.
//!
//! ```ignore
//! use bearer_guard::middleware::{self, Exclusions, JwtAuth, Middleware};
//! use bearer_guard::services::verifier::Secret;
//!
//! let auth = JwtAuth::builder()
//!     .secret(Secret::shared("shhhhhh"))
//!     .audience("http://myapi/protected")
//!     .build();
//! let router = middleware::apply(router, auth.unless(Exclusions::new().path("/public")));
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod services;
pub mod state;

pub use error::AuthError;
pub use identity::{AuthStatus, Claims, Identity, MaybeIdentity, RequestState};
pub use middleware::{Exclusions, JwtAuth, JwtAuthBuilder, Located, Middleware, TokenSource};
pub use services::revocation::{CacheDenylist, RevocationCheck, RevocationError};
pub use services::verifier::{Secret, TokenVerifier, VerifyOptions};

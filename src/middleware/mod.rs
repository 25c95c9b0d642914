/*
 * Responsibility
 * - Middleware: a request pipeline stage that may answer or hand over to `next`
 * - apply(): mount any Middleware on a Router (via from_fn_with_state)
 * - Re-exports of the JWT middleware and the exclusion combinator
 */
use std::future::Future;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self as axum_middleware, Next},
    response::Response,
};

pub mod auth;
pub mod exclusion;
pub mod http;

pub use auth::{JwtAuth, JwtAuthBuilder, Located, QueryParam, TokenSource};
pub use exclusion::{ExclusionError, Exclusions, PathPattern, Unless};

/// A pipeline stage wrapping the rest of the stack (`next`).
pub trait Middleware: Clone + Send + Sync + 'static {
    fn handle(&self, req: Request<Body>, next: Next) -> impl Future<Output = Response> + Send;

    /// Skip this middleware for requests matching `rules`.
    fn unless(self, rules: Exclusions) -> Unless<Self>
    where
        Self: Sized,
    {
        Unless::new(self, rules)
    }
}

/// Apply `middleware` to every route of `router`.
///
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::apply(v1, auth.unless(Exclusions::new().path("/health")));
/// ```
pub fn apply<M, S>(router: Router<S>, middleware: M) -> Router<S>
where
    M: Middleware,
    S: Clone + Send + Sync + 'static,
{
    router.layer(axum_middleware::from_fn_with_state(middleware, run::<M>))
}

async fn run<M: Middleware>(State(middleware): State<M>, req: Request<Body>, next: Next) -> Response {
    middleware.handle(req, next).await
}

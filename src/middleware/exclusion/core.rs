use std::sync::Arc;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::middleware::Middleware;
use crate::middleware::exclusion::rules::Exclusions;

/// Runs `inner` unless the request matches one of `rules`.
///
/// Built with [`Middleware::unless`]; excluded requests go straight to `next`
/// and the wrapped middleware never sees them.
#[derive(Debug, Clone)]
pub struct Unless<M> {
    inner: M,
    rules: Arc<Exclusions>,
}

impl<M> Unless<M> {
    pub fn new(inner: M, rules: Exclusions) -> Self {
        Self {
            inner,
            rules: Arc::new(rules),
        }
    }
}

impl<M: Middleware> Middleware for Unless<M> {
    async fn handle(&self, req: Request<Body>, next: Next) -> Response {
        if self.rules.matches(&req) {
            tracing::trace!(method = %req.method(), path = %req.uri().path(), "excluded");
            return next.run(req).await;
        }

        self.inner.handle(req, next).await
    }
}

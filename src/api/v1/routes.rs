/*
 * Responsibility
 * - v1 URL layout (/me, /session/revoke)
 * - Auth is applied by app.rs around the whole router, not here
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{me::me, session::revoke};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/session/revoke", post(revoke))
}

/*
 * Responsibility
 * - GET /me: echo the verified claims
 * - Under passthrough, report why authentication failed instead
 */
use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::identity::{AuthStatus, RequestState};
use crate::state::AppState;

pub async fn me(
    State(state): State<AppState>,
    request_state: RequestState,
) -> (StatusCode, Json<Value>) {
    if let Some(claims) = request_state.claims(&state.claims_key) {
        return (StatusCode::OK, Json(json!({ state.claims_key.as_str(): claims })));
    }

    let reason = match request_state.status() {
        Some(AuthStatus::PassthroughRejected(err)) => err.public_message(false),
        _ => "not authenticated".to_string(),
    };
    (
        StatusCode::OK,
        Json(json!({ "authenticated": false, "reason": reason })),
    )
}

/*
 * Responsibility
 * - POST /session/revoke: put the presented token on the denylist
 * - Following requests with the same token answer 401 (Revoked token)
 */
use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::identity::RequestState;
use crate::state::{AppState, TOKEN_KEY};

pub async fn revoke(
    State(state): State<AppState>,
    request_state: RequestState,
) -> Result<Json<Value>, StatusCode> {
    let (Some(claims), Some(token)) = (
        request_state.claims(&state.claims_key),
        request_state.token(TOKEN_KEY),
    ) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let revoked = state.denylist.revoke(token, claims).await.map_err(|err| {
        tracing::error!(error = %err, "revocation failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(json!({ "revoked": revoked })))
}

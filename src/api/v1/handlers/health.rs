/*
 * Responsibility
 * - GET /health: liveness check, never authenticated (AUTH_EXCLUDE_PATHS)
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

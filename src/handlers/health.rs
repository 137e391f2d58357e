//! Liveness handler for the internal registry app.

use axum::Json;
use serde_json::Value;
use serde_json::json;

/// `GET /health` - liveness.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

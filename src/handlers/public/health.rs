use axum::response::Json;
use serde_json::{json, Value};

/// GET /health - liveness only; the backend is not probed
pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now(),
        }
    }))
}

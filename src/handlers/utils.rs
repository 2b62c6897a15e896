use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Parse a request body as JSON without imposing a shape on it.
///
/// An empty body reads as `{}`; anything else must be valid JSON.
pub fn json_body(bytes: &Bytes) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(bytes).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
}

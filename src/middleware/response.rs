use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Successful handler output.
///
/// Writes either acknowledge with `{"success": true}` or hand back the
/// backend's data as the whole body, with no envelope.
#[derive(Debug)]
pub enum ApiResponse<T = Value> {
    Success,
    Data(T),
}

impl ApiResponse<Value> {
    pub fn success() -> Self {
        ApiResponse::Success
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        ApiResponse::Data(data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data = match self {
            ApiResponse::Success => return Json(json!({ "success": true })).into_response(),
            ApiResponse::Data(data) => data,
        };

        match serde_json::to_value(&data) {
            Ok(value) => Json(value).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                ApiError::internal_server_error("Failed to serialize response data").into_response()
            }
        }
    }
}

pub type ApiResult<T = Value> = Result<ApiResponse<T>, ApiError>;

use axum::extract::Extension;
use serde_json::json;

use crate::middleware::{ApiResponse, ApiResult, AuthUser, ScopedClient};

/// POST /user/delete - flag the caller's account via `mark_user_deleted`
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Extension(client): Extension<ScopedClient>,
) -> ApiResult {
    client.rpc("mark_user_deleted", json!({ "uid": user.id })).await?;

    tracing::info!("Marked user {} as deleted", user.id);
    Ok(ApiResponse::success())
}

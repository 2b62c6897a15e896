use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
};
use serde_json::json;

use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ScopedClient};

/// GET /profile - the caller's row in `profiles`
///
/// A missing row is whatever the backend says it is (a 400), not a 404.
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Extension(client): Extension<ScopedClient>,
) -> ApiResult {
    let profile = client.from("profiles").eq("id", &user.id).single().await?;
    Ok(ApiResponse::data(profile))
}

/// POST /profile - upsert `{id, name}` for the caller
///
/// Only `name` is taken from the body; the id always comes from the token.
/// Without a `name` key only the id is sent, leaving any stored name as is.
pub async fn post(
    Extension(user): Extension<AuthUser>,
    Extension(client): Extension<ScopedClient>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let body = json_body(&body?)?;

    let mut row = json!({ "id": user.id });
    if let Some(name) = body.get("name") {
        row["name"] = name.clone();
    }

    client.from("profiles").upsert(row).await?;

    tracing::debug!("Upserted profile for user {}", user.id);
    Ok(ApiResponse::success())
}

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension, Path},
};

use crate::handlers::utils::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ScopedClient};

/// POST /entries - hand the body to the `insert_entry` function
///
/// The body is not validated here; the function owns the entry schema.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Extension(client): Extension<ScopedClient>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let entry = json_body(&body?)?;

    client.invoke("insert_entry", Some(entry)).await?;

    tracing::debug!("Inserted entry for user {}", user.id);
    Ok(ApiResponse::success())
}

/// PUT /entries/:id - hand the body to the `update_entry` function
///
/// The entry to update is identified by the body itself; the path id is
/// only logged.
pub async fn update(
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Extension(client): Extension<ScopedClient>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let entry = json_body(&body?)?;

    client.invoke("update_entry", Some(entry)).await?;

    tracing::debug!("Updated entry {} for user {}", id, user.id);
    Ok(ApiResponse::success())
}

/// GET /entries - whatever `get_entries` returns, verbatim
pub async fn list(Extension(client): Extension<ScopedClient>) -> ApiResult {
    let data = client.invoke("get_entries", None).await?;
    Ok(ApiResponse::data(data))
}

/// DELETE /entries/:id
///
/// Succeeds whenever the backend reports no error, whether or not a row
/// matched. Row-level security keeps other users' rows out of reach.
pub async fn delete(
    Path(id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Extension(client): Extension<ScopedClient>,
) -> ApiResult {
    client.from("entries").eq("id", &id).delete().await?;

    tracing::debug!("Deleted entry {} for user {}", id, user.id);
    Ok(ApiResponse::success())
}

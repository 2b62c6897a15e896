use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::catalog::{default_icons, nest_categories};

/// GET /categories - categories with their subcategories nested
///
/// Both tables are read in sequence; a failure on either is a 400.
pub async fn categories(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let categories = state.public.from("categories").select().await?;
    let subcategories = state.public.from("subcategories").select().await?;

    Ok(ApiResponse::data(nest_categories(categories, subcategories)))
}

/// GET /icons - unique icon tokens of the default (ownerless) icon row
pub async fn icons(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let rows = state.public.from("icons").select().await?;
    Ok(ApiResponse::data(default_icons(&rows)))
}

/// GET /prompts
pub async fn prompts(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let prompts = state.public.from("prompts").select().await?;
    Ok(ApiResponse::data(prompts))
}

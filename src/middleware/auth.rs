use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::extract_bearer_token;
use crate::error::ApiError;

pub use crate::auth::{AuthUser, ScopedClient};

/// Bearer authentication for protected routes.
///
/// On success the request carries the resolved [`AuthUser`] and a fresh
/// [`ScopedClient`] bound to the caller's token; nothing is cached between
/// requests.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    let user = state.validator.validate(&token).await?;

    tracing::debug!("Authenticated user {} for {} {}", user.id, request.method(), request.uri().path());

    let client = state.clients.for_user(&token);
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(client);

    Ok(next.run(request).await)
}

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{ClientFactory, TokenValidator};
use crate::backend::{Backend, Client};
use crate::config::{AppConfig, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::require_user;

/// Shared, read-only handler state.
///
/// `public` is the single process-wide anonymous client. Scoped clients are
/// never stored here; `clients` mints one per authenticated request.
#[derive(Clone)]
pub struct AppState {
    pub validator: TokenValidator,
    pub clients: ClientFactory,
    pub public: Client,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let clients = ClientFactory::new(backend.clone());
        Self {
            validator: TokenValidator::new(backend),
            public: clients.anonymous(),
            clients,
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        // Public
        .merge(public_routes())
        // Protected (bearer token)
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    let router = if config.security.enable_cors {
        router.layer(cors_layer(&config.security))
    } else {
        router
    };

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health))
        .route("/categories", get(public::catalog_categories))
        .route("/icons", get(public::catalog_icons))
        .route("/prompts", get(public::catalog_prompts))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/entries",
            get(protected::entry_list).post(protected::entry_create),
        )
        .route(
            "/entries/:id",
            put(protected::entry_update).delete(protected::entry_delete),
        )
        .route(
            "/profile",
            get(protected::profile_get).post(protected::profile_post),
        )
        .route("/user/delete", post(protected::user_delete))
        // route_layer: unmatched paths still 404 instead of 401
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparseable CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::access::{AccessChecker, RemoteAccessChecker, RoleAccessChecker};
use crate::config::AppConfig;
use crate::database::EntityStore;
use crate::handlers::{protected::data, public};
use crate::middleware::session_middleware;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn EntityStore>,
    pub access: Arc<dyn AccessChecker>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn EntityStore>, access: Arc<dyn AccessChecker>) -> Self {
        Self { config: Arc::new(config), store, access }
    }

    /// Remote access checks when an auth service is configured, the local
    /// role policy otherwise
    pub fn from_config(config: AppConfig, store: Arc<dyn EntityStore>) -> Self {
        let access: Arc<dyn AccessChecker> = match &config.access.auth_url {
            Some(url) => {
                info!("Delegating access checks to {}", url);
                Arc::new(RemoteAccessChecker::new(url))
            }
            None => Arc::new(RoleAccessChecker::new(&config.access)),
        };
        Self::new(config, store, access)
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .route(
            "/api/:resource",
            get(data::resource_get)
                .post(data::resource_post)
                .fallback(data::method_not_allowed),
        )
        .route(
            "/api/:resource/:id",
            get(data::record_get)
                .put(data::record_put)
                .delete(data::record_delete)
                .fallback(data::method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    let mut app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .merge(api)
        .fallback(public::not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if let Some(cors) = cors_layer(&config) {
        app = app.layer(cors);
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    let security = &config.security;
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security.cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
    Some(CorsLayer::permissive().allow_origin(AllowOrigin::list(origins)))
}

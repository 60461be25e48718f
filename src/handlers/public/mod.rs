// handlers/public/mod.rs - Public handlers (no session required)
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::entity::ENTITIES;
use crate::error::ApiError;

/// GET / - service info
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let access = &state.config.access;
    let resources: Vec<String> = ENTITIES.iter().map(|e| format!("/api/{}", e.route)).collect();

    Json(json!({
        "name": "Orypto Admin API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-tenant admin CRUD API for startups, their staff and partner stores",
        "application": access.application_name,
        "tenant": access.tenant_name,
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "list": "GET /api/:resource?limit&offset&order&searchTerm&relations&<field>=<value>",
            "create": "POST /api/:resource",
            "show": "GET /api/:resource/:id?relations",
            "update": "PUT /api/:resource/:id",
            "delete": "DELETE /api/:resource/:id",
        },
        "resources": resources,
    }))
}

/// GET /health - data layer status
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

/// Any path without a route
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

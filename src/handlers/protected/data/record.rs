use axum::{
    extract::{rejection::JsonRejection, Extension, Path, RawQuery, State},
    http::Method,
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::validation::{validate, ValidationMode};

use super::utils::{authorize, guard_payload, query_params, resolve_entity, translate};

/// GET /api/:resource/:id - show a single record, honouring `relations`
pub async fn get(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    RawQuery(raw): RawQuery,
    Extension(ctx): Extension<RequestContext>,
    method: Method,
) -> Result<Json<Value>, ApiError> {
    let entity = resolve_entity(&resource)?;
    authorize(&state, &ctx, entity, Some(&id), &method).await?;

    // The path id wins over any `id` filter in the query string
    let mut params = query_params(raw.as_deref());
    params.set("id", id.as_str());
    let args = translate(&state, &params, entity)?;

    match state.store.find_first(entity, &args).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::not_found(format!("{} {} not found", entity.name, id))),
    }
}

/// PUT /api/:resource/:id - partial update
pub async fn put(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Extension(ctx): Extension<RequestContext>,
    method: Method,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let entity = resolve_entity(&resource)?;
    let operation = authorize(&state, &ctx, entity, Some(&id), &method).await?;

    let Json(mut payload) = payload?;
    guard_payload(&state, &ctx, entity, &mut payload, operation).await?;
    let data = validate(entity, &payload, ValidationMode::Update)?;

    let updated = state.store.update(entity, &id, data).await?;
    tracing::info!(user = %ctx.user_id, entity = entity.name, id = %id, "Updated record");
    Ok(Json(updated))
}

/// DELETE /api/:resource/:id
pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Extension(ctx): Extension<RequestContext>,
    method: Method,
) -> Result<Json<Value>, ApiError> {
    let entity = resolve_entity(&resource)?;
    authorize(&state, &ctx, entity, Some(&id), &method).await?;

    let deleted = state.store.delete(entity, &id).await?;
    tracing::info!(user = %ctx.user_id, entity = entity.name, id = %id, "Deleted record");
    Ok(Json(deleted))
}

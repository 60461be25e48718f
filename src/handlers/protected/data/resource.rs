use axum::{
    extract::{rejection::JsonRejection, Extension, Path, RawQuery, State},
    http::Method,
    Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::CreateInput;
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::models::Paginated;
use crate::validation::{validate, ValidationMode};

use super::utils::{authorize, guard_payload, query_params, resolve_entity, translate};

/// GET /api/:resource - one page of the session tenant's records
pub async fn get(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    RawQuery(raw): RawQuery,
    Extension(ctx): Extension<RequestContext>,
    method: Method,
) -> Result<Json<Paginated<Value>>, ApiError> {
    let entity = resolve_entity(&resource)?;
    authorize(&state, &ctx, entity, None, &method).await?;

    let args = translate(&state, &query_params(raw.as_deref()), entity)?;
    let page = state.store.find_many_paginated(entity, &args, &ctx.tenant_id).await?;
    Ok(Json(page))
}

/// POST /api/:resource - create a record; child arrays become nested creates
pub async fn post(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Extension(ctx): Extension<RequestContext>,
    method: Method,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let entity = resolve_entity(&resource)?;
    let operation = authorize(&state, &ctx, entity, None, &method).await?;

    let Json(mut payload) = payload?;
    guard_payload(&state, &ctx, entity, &mut payload, operation).await?;
    let data = validate(entity, &payload, ValidationMode::Create)?;

    let input = CreateInput::from_payload(entity, data);
    let children = input.child_count();
    let created = state.store.create(entity, input).await?;

    tracing::info!(user = %ctx.user_id, entity = entity.name, children, "Created record");
    Ok(Json(created))
}

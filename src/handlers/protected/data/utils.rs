use axum::http::Method;
use serde_json::{Map, Value};

use crate::access::AccessRequest;
use crate::app::AppState;
use crate::database::ResourceTenant;
use crate::database::store::value_text;
use crate::entity::{self, EntityDef, RelationKind, TenantScope};
use crate::error::ApiError;
use crate::middleware::RequestContext;
use crate::query::{self, FindArgs, QueryParams};
use crate::types::AccessOperation;
use crate::validation::ValidationError;

/// Map the `:resource` path segment onto its entity
pub fn resolve_entity(resource: &str) -> Result<&'static EntityDef, ApiError> {
    entity::by_route(resource).ok_or_else(|| ApiError::not_found(format!("Unknown resource '{}'", resource)))
}

pub fn query_params(raw: Option<&str>) -> QueryParams {
    raw.map(QueryParams::parse).unwrap_or_default()
}

pub fn translate(state: &AppState, params: &QueryParams, entity: &'static EntityDef) -> Result<FindArgs, ApiError> {
    Ok(query::translate(params, entity, &state.config.query)?)
}

/// Map the request method onto its access operation and ask the access
/// collaborator before any data-layer call.
pub async fn authorize(
    state: &AppState,
    ctx: &RequestContext,
    entity: &'static EntityDef,
    resource_id: Option<&str>,
    method: &Method,
) -> Result<AccessOperation, ApiError> {
    let operation = AccessOperation::from_method(method).ok_or_else(|| ApiError::method_not_allowed(method))?;
    let resource_tenant = match resource_id {
        Some(id) => state.store.resource_tenant(entity, id).await?,
        None => ResourceTenant::Unscoped,
    };
    // Orphaned records belong to no tenant, so no session may reach them
    if resource_id.is_some() && resource_tenant == ResourceTenant::Unscoped {
        tracing::warn!(user = %ctx.user_id, entity = entity.name, "Record outside any tenant refused");
        return Err(ApiError::forbidden(format!("{} on {} is not permitted", operation, entity.name)));
    }

    let request = AccessRequest { entity, resource_id, resource_tenant, operation };
    if !state.access.has_access(ctx, &request).await? {
        return Err(ApiError::forbidden(format!(
            "{} on {} is not permitted",
            operation,
            entity.name
        )));
    }
    Ok(operation)
}

/// Keep writes inside the session's tenant. Direct tenant columns default to
/// the session tenant on create and may never name another tenant. Parent
/// references are required on create, may not be cleared, and must point at a
/// record of the session tenant. Nested children are checked the same way
/// unless their tenant comes from the record being created.
pub async fn guard_payload(
    state: &AppState,
    ctx: &RequestContext,
    entity: &'static EntityDef,
    payload: &mut Value,
    operation: AccessOperation,
) -> Result<(), ApiError> {
    let Value::Object(fields) = payload else {
        // Shape problems are reported by validation
        return Ok(());
    };
    guard_record(state, ctx, entity, fields, operation, "").await?;

    if operation != AccessOperation::Create {
        return Ok(());
    }
    for relation in entity.relations.iter().filter(|r| r.kind == RelationKind::HasMany) {
        let Some(Value::Array(children)) = fields.get_mut(relation.name) else { continue };
        let target = relation.target_def();
        // Children scoped through this relation inherit the parent's tenant
        if matches!(target.tenant, TenantScope::Parent { foreign_key, .. } if foreign_key == relation.foreign_key) {
            continue;
        }
        for (index, child) in children.iter_mut().enumerate() {
            if let Value::Object(child) = child {
                let prefix = format!("{}[{}].", relation.name, index);
                guard_record(state, ctx, target, child, operation, &prefix).await?;
            }
        }
    }
    Ok(())
}

async fn guard_record(
    state: &AppState,
    ctx: &RequestContext,
    entity: &'static EntityDef,
    fields: &mut Map<String, Value>,
    operation: AccessOperation,
    prefix: &str,
) -> Result<(), ApiError> {
    match entity.tenant {
        TenantScope::Column(column) => match fields.get(column) {
            None | Some(Value::Null) if operation == AccessOperation::Create => {
                fields.insert(column.to_string(), Value::String(ctx.tenant_id.clone()));
            }
            Some(value) if value_text(value).is_some_and(|t| t != ctx.tenant_id) => {
                tracing::warn!(user = %ctx.user_id, entity = entity.name, "Payload names a foreign tenant");
                return Err(ApiError::forbidden(format!("{}{} must be the session tenant", prefix, column)));
            }
            _ => {}
        },
        TenantScope::Parent { foreign_key, parent } => {
            let field = format!("{}{}", prefix, foreign_key);
            let parent_id = match fields.get(foreign_key) {
                Some(Value::String(id)) => id.clone(),
                None if operation == AccessOperation::Update => return Ok(()),
                None => return Err(ValidationError::field(field, "is required").into()),
                Some(Value::Null) => return Err(ValidationError::field(field, "must not be null").into()),
                // Type problems are reported by validation
                Some(_) => return Ok(()),
            };
            let Some(parent_def) = entity::by_name(parent) else {
                return Ok(());
            };
            match state.store.resource_tenant(parent_def, &parent_id).await? {
                ResourceTenant::Tenant(tenant) if tenant == ctx.tenant_id => {}
                ResourceTenant::Missing => {
                    return Err(ValidationError::field(field, format!("does not reference an existing {}", parent)).into());
                }
                _ => {
                    tracing::warn!(user = %ctx.user_id, entity = entity.name, "Payload references a foreign {}", parent);
                    return Err(ApiError::forbidden(format!(
                        "{} must reference a {} of the session tenant",
                        field, parent
                    )));
                }
            }
        }
    }
    Ok(())
}

//! Authorization seam.
//!
//! Every `/api` request asks an `AccessChecker` whether the session may perform
//! the operation before the data layer is touched. The local policy works off
//! the configured role names; the remote adapter delegates to the auth service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::AccessConfig;
use crate::database::ResourceTenant;
use crate::entity::EntityDef;
use crate::middleware::RequestContext;
use crate::types::AccessOperation;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Authorization service request failed: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("Authorization service answered {0}")]
    RemoteStatus(u16),
}

/// What is being accessed. `resource_tenant` is only meaningful when
/// `resource_id` is set.
#[derive(Debug, Clone)]
pub struct AccessRequest<'a> {
    pub entity: &'static EntityDef,
    pub resource_id: Option<&'a str>,
    pub resource_tenant: ResourceTenant,
    pub operation: AccessOperation,
}

#[async_trait]
pub trait AccessChecker: Send + Sync {
    async fn has_access(&self, ctx: &RequestContext, request: &AccessRequest<'_>) -> Result<bool, AccessError>;
}

/// Local policy: owners may do anything in their tenant, other tenant roles
/// may only read, everyone else is denied. Customer roles never reach admin
/// data, whatever else the session holds.
#[derive(Debug, Clone)]
pub struct RoleAccessChecker {
    owner_roles: Vec<String>,
    tenant_roles: Vec<String>,
    customer_roles: Vec<String>,
}

impl RoleAccessChecker {
    pub fn new(config: &AccessConfig) -> Self {
        Self {
            owner_roles: config.owner_roles.clone(),
            tenant_roles: config.tenant_roles.clone(),
            customer_roles: config.customer_roles.clone(),
        }
    }

    fn holds_any(ctx: &RequestContext, roles: &[String]) -> bool {
        ctx.roles.iter().any(|role| roles.iter().any(|r| r.eq_ignore_ascii_case(role)))
    }
}

#[async_trait]
impl AccessChecker for RoleAccessChecker {
    async fn has_access(&self, ctx: &RequestContext, request: &AccessRequest<'_>) -> Result<bool, AccessError> {
        if let ResourceTenant::Tenant(tenant) = &request.resource_tenant {
            if tenant != &ctx.tenant_id {
                warn!(
                    user = %ctx.user_id,
                    entity = request.entity.name,
                    resource = request.resource_id.unwrap_or_default(),
                    "Cross-tenant {} denied",
                    request.operation
                );
                return Ok(false);
            }
        }

        if Self::holds_any(ctx, &self.customer_roles) {
            warn!(user = %ctx.user_id, entity = request.entity.name, "Customer session refused");
            return Ok(false);
        }

        let allowed = Self::holds_any(ctx, &self.owner_roles)
            || (!request.operation.is_mutation() && Self::holds_any(ctx, &self.tenant_roles));
        if !allowed {
            warn!(user = %ctx.user_id, roles = ?ctx.roles, entity = request.entity.name, "{} denied", request.operation);
        }
        Ok(allowed)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteCheck<'a> {
    roq_user_id: &'a str,
    tenant_id: &'a str,
    roles: &'a [String],
    entity: &'a str,
    resource_id: Option<&'a str>,
    operation: AccessOperation,
}

#[derive(Debug, Deserialize)]
struct RemoteDecision {
    allowed: bool,
}

/// Delegates every decision to `{auth_url}/access/check`
#[derive(Debug, Clone)]
pub struct RemoteAccessChecker {
    client: reqwest::Client,
    url: String,
}

impl RemoteAccessChecker {
    pub fn new(auth_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/access/check", auth_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl AccessChecker for RemoteAccessChecker {
    async fn has_access(&self, ctx: &RequestContext, request: &AccessRequest<'_>) -> Result<bool, AccessError> {
        let body = RemoteCheck {
            roq_user_id: &ctx.user_id,
            tenant_id: &ctx.tenant_id,
            roles: &ctx.roles,
            entity: request.entity.name,
            resource_id: request.resource_id,
            operation: request.operation,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(AccessError::RemoteStatus(response.status().as_u16()));
        }
        let decision: RemoteDecision = response.json().await?;
        if !decision.allowed {
            warn!(user = %ctx.user_id, entity = request.entity.name, "{} denied by auth service", request.operation);
        }
        Ok(decision.allowed)
    }
}

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::nested::CreateInput;
use crate::entity::EntityDef;
use crate::models::Paginated;
use crate::query::{FindArgs, QueryError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl StoreError {
    pub fn not_found(entity: &EntityDef, id: &str) -> Self {
        StoreError::NotFound { entity: entity.name.to_string(), id: id.to_string() }
    }
}

/// Which tenant an existing record belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTenant {
    Missing,
    /// The record exists but no tenant claims it (e.g. staff without a startup)
    Unscoped,
    Tenant(String),
}

/// The data layer. Records travel as JSON objects keyed by column name, with
/// included relations attached under the relation name and counts under
/// `_count`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// One page of `entity` records visible to `tenant_id`, plus the total
    /// number of matches. An empty `order_by` sorts newest first.
    async fn find_many_paginated(
        &self,
        entity: &'static EntityDef,
        args: &FindArgs,
        tenant_id: &str,
    ) -> Result<Paginated<Value>, StoreError>;

    async fn find_first(&self, entity: &'static EntityDef, args: &FindArgs) -> Result<Option<Value>, StoreError>;

    /// Insert the parent and every nested child atomically
    async fn create(&self, entity: &'static EntityDef, input: CreateInput) -> Result<Value, StoreError>;

    async fn update(&self, entity: &'static EntityDef, id: &str, fields: Map<String, Value>) -> Result<Value, StoreError>;

    async fn delete(&self, entity: &'static EntityDef, id: &str) -> Result<Value, StoreError>;

    async fn resource_tenant(&self, entity: &'static EntityDef, id: &str) -> Result<ResourceTenant, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stamp the system columns onto a new record
pub fn new_record(mut fields: Map<String, Value>) -> Map<String, Value> {
    let now = timestamp_now();
    fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    fields.insert("created_at".to_string(), Value::String(now.clone()));
    fields.insert("updated_at".to_string(), Value::String(now));
    fields
}

/// Text form used for equality comparisons and relation keys
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

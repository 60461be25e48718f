use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::debug;

use super::manager::{DatabaseError, DatabaseManager};
use super::nested::CreateInput;
use super::sql::{self, SqlResult};
use super::store::{new_record, value_text, EntityStore, ResourceTenant, StoreError};
use crate::entity::{EntityDef, RelationDef, RelationKind};
use crate::models::Paginated;
use crate::query::{FindArgs, Include};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(DatabaseError::from(err))
    }
}

/// `EntityStore` over the PostgreSQL schema that mirrors the entity registry
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(&self, sql: &SqlResult) -> Result<Vec<Value>, StoreError> {
        debug!(query = %sql.query, params = sql.params.len(), "sql");
        let rows = sql.bind().fetch_all(&self.pool).await?;
        rows.iter().map(json_row).collect()
    }

    async fn fetch_optional(&self, sql: &SqlResult) -> Result<Option<Value>, StoreError> {
        debug!(query = %sql.query, params = sql.params.len(), "sql");
        let row = sql.bind().fetch_optional(&self.pool).await?;
        row.as_ref().map(json_row).transpose()
    }

    /// Attach included relations and `_count` to every row, one query per relation
    async fn attach(&self, entity: &EntityDef, rows: &mut [Value], include: &Include) -> Result<(), StoreError> {
        if include.is_empty() || rows.is_empty() {
            return Ok(());
        }

        let view: &[Value] = rows;
        let loads = include.load.iter().filter_map(|name| entity.relation(name)).map(|relation| self.load(relation, view));
        let loaded = try_join_all(loads).await?;

        let counts = include.count.iter().filter_map(|name| entity.relation(name)).map(|relation| self.count(relation, view));
        let counted = try_join_all(counts).await?;

        for row in rows.iter_mut() {
            let Value::Object(record) = row else { continue };
            let id = record.get("id").and_then(value_text);

            for (relation, related) in &loaded {
                let value = match relation.kind {
                    RelationKind::HasMany => {
                        let children = id.as_ref().and_then(|id| related.get(id)).cloned().unwrap_or_default();
                        Value::Array(children)
                    }
                    RelationKind::BelongsTo => record
                        .get(relation.foreign_key)
                        .and_then(value_text)
                        .and_then(|key| related.get(&key))
                        .and_then(|matches| matches.first().cloned())
                        .unwrap_or(Value::Null),
                };
                record.insert(relation.name.to_string(), value);
            }

            if !counted.is_empty() {
                let mut counts = Map::new();
                for (relation, by_parent) in &counted {
                    let n = id.as_ref().and_then(|id| by_parent.get(id)).copied().unwrap_or(0);
                    counts.insert(relation.name.to_string(), Value::from(n));
                }
                record.insert("_count".to_string(), Value::Object(counts));
            }
        }
        Ok(())
    }

    /// Related rows grouped by the key that links them back to `rows`
    async fn load(
        &self,
        relation: &'static RelationDef,
        rows: &[Value],
    ) -> Result<(&'static RelationDef, HashMap<String, Vec<Value>>), StoreError> {
        let (link_column, group_column) = match relation.kind {
            RelationKind::HasMany => ("id", relation.foreign_key),
            RelationKind::BelongsTo => (relation.foreign_key, "id"),
        };
        let keys: Vec<String> = rows.iter().filter_map(|r| r.get(link_column).and_then(value_text)).collect();

        let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
        if keys.is_empty() {
            return Ok((relation, grouped));
        }

        let query = sql::select_related(relation.target_def(), group_column);
        debug!(%query, "sql");
        for row in sqlx::query(&query).bind(keys).fetch_all(&self.pool).await? {
            let related = json_row(&row)?;
            if let Some(key) = related.get(group_column).and_then(value_text) {
                grouped.entry(key).or_default().push(related);
            }
        }
        Ok((relation, grouped))
    }

    async fn count(
        &self,
        relation: &'static RelationDef,
        rows: &[Value],
    ) -> Result<(&'static RelationDef, HashMap<String, i64>), StoreError> {
        let ids: Vec<String> = rows.iter().filter_map(|r| r.get("id").and_then(value_text)).collect();
        let query = sql::count_related(relation.target_def(), relation.foreign_key);
        debug!(%query, "sql");

        let mut counts = HashMap::new();
        for row in sqlx::query(&query).bind(ids).fetch_all(&self.pool).await? {
            counts.insert(row.try_get::<String, _>("key")?, row.try_get::<i64, _>("count")?);
        }
        Ok((relation, counts))
    }
}

fn json_row(row: &PgRow) -> Result<Value, StoreError> {
    Ok(row.try_get::<Value, _>("row")?)
}

#[async_trait]
impl EntityStore for PgStore {
    async fn find_many_paginated(
        &self,
        entity: &'static EntityDef,
        args: &FindArgs,
        tenant_id: &str,
    ) -> Result<Paginated<Value>, StoreError> {
        args.check_columns(entity)?;

        let mut data = self.fetch_rows(&sql::select_page(entity, args, Some(tenant_id))).await?;

        let count = sql::count(entity, args, tenant_id);
        debug!(query = %count.query, "sql");
        let total_count: i64 = count.bind().fetch_one(&self.pool).await?.try_get("count")?;

        self.attach(entity, &mut data, &args.include).await?;
        Ok(Paginated { data, total_count })
    }

    async fn find_first(&self, entity: &'static EntityDef, args: &FindArgs) -> Result<Option<Value>, StoreError> {
        args.check_columns(entity)?;

        let mut rows = self.fetch_rows(&sql::select_page(entity, args, None)).await?;
        rows.truncate(1);
        self.attach(entity, &mut rows, &args.include).await?;
        Ok(rows.pop())
    }

    async fn create(&self, entity: &'static EntityDef, input: CreateInput) -> Result<Value, StoreError> {
        let children = input.child_count();
        let mut tx = self.pool.begin().await?;

        let parent = new_record(input.fields);
        let parent_id = parent["id"].clone();
        let insert = sql::insert(entity, &parent);
        debug!(query = %insert.query, "sql");
        let created = json_row(&insert.bind().fetch_one(&mut *tx).await?)?;

        for child in &input.children {
            let target = child.relation.target_def();
            for record in &child.records {
                let mut row = new_record(record.clone());
                row.insert(child.relation.foreign_key.to_string(), parent_id.clone());
                sql::insert(target, &row).bind().execute(&mut *tx).await?;
            }
        }

        tx.commit().await?;
        debug!(entity = entity.name, children, "created");
        Ok(created)
    }

    async fn update(&self, entity: &'static EntityDef, id: &str, fields: Map<String, Value>) -> Result<Value, StoreError> {
        self.fetch_optional(&sql::update(entity, id, &fields))
            .await?
            .ok_or_else(|| StoreError::not_found(entity, id))
    }

    async fn delete(&self, entity: &'static EntityDef, id: &str) -> Result<Value, StoreError> {
        self.fetch_optional(&sql::delete(entity, id))
            .await?
            .ok_or_else(|| StoreError::not_found(entity, id))
    }

    async fn resource_tenant(&self, entity: &'static EntityDef, id: &str) -> Result<ResourceTenant, StoreError> {
        let lookup = sql::resource_tenant(entity, id);
        let Some(row) = lookup.bind().fetch_optional(&self.pool).await? else {
            return Ok(ResourceTenant::Missing);
        };
        Ok(match row.try_get::<Option<String>, _>("tenant")? {
            Some(tenant) => ResourceTenant::Tenant(tenant),
            None => ResourceTenant::Unscoped,
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await?;
        Ok(())
    }
}

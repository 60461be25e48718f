//! In-memory `EntityStore` for local runs and tests.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::nested::CreateInput;
use super::store::{new_record, timestamp_now, value_text, EntityStore, ResourceTenant, StoreError};
use crate::entity::{EntityDef, RelationDef, RelationKind, TenantScope, ENTITIES};
use crate::models::Paginated;
use crate::query::{Condition, FindArgs, Include, OrderBy, SortDirection, WhereInput};

type Row = Map<String, Value>;
type Tables = HashMap<&'static str, Vec<Row>>;

/// Rows per entity behind one lock. Writes take the lock once, so a nested
/// create is all-or-nothing. Deleting a referenced row treats nullable foreign
/// keys like `ON DELETE SET NULL` and required ones like `ON DELETE RESTRICT`.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables = ENTITIES.iter().map(|e| (e.name, Vec::new())).collect();
        Self { tables: RwLock::new(tables) }
    }

    pub async fn len(&self, entity: &EntityDef) -> usize {
        self.tables.read().await.get(entity.name).map_or(0, Vec::len)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_many_paginated(
        &self,
        entity: &'static EntityDef,
        args: &FindArgs,
        tenant_id: &str,
    ) -> Result<Paginated<Value>, StoreError> {
        args.check_columns(entity)?;
        let tables = self.tables.read().await;

        let mut rows: Vec<&Row> = table(&tables, entity)
            .iter()
            .filter(|row| matches_where(row, &args.where_input))
            .filter(|row| tenant_of(&tables, entity, row).as_deref() == Some(tenant_id))
            .collect();
        let total_count = rows.len() as i64;

        sort_rows(&mut rows, &args.order_by);

        let data = rows
            .into_iter()
            .skip(args.skip.max(0) as usize)
            .take(args.take.max(0) as usize)
            .map(|row| Value::Object(expand(&tables, entity, row, &args.include)))
            .collect();

        Ok(Paginated { data, total_count })
    }

    async fn find_first(&self, entity: &'static EntityDef, args: &FindArgs) -> Result<Option<Value>, StoreError> {
        args.check_columns(entity)?;
        let tables = self.tables.read().await;

        let mut rows: Vec<&Row> = table(&tables, entity)
            .iter()
            .filter(|row| matches_where(row, &args.where_input))
            .collect();
        sort_rows(&mut rows, &args.order_by);

        Ok(rows
            .first()
            .map(|row| Value::Object(expand(&tables, entity, row, &args.include))))
    }

    async fn create(&self, entity: &'static EntityDef, input: CreateInput) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;

        let parent = new_record(input.fields);
        let parent_id = parent["id"].clone();

        for child in input.children {
            let target = child.relation.target_def();
            let rows = tables.entry(target.name).or_default();
            for record in child.records {
                let mut row = new_record(record);
                row.insert(child.relation.foreign_key.to_string(), parent_id.clone());
                rows.push(row);
            }
        }

        tables.entry(entity.name).or_default().push(parent.clone());
        Ok(Value::Object(parent))
    }

    async fn update(&self, entity: &'static EntityDef, id: &str, fields: Map<String, Value>) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .entry(entity.name)
            .or_default()
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(|| StoreError::not_found(entity, id))?;

        for (key, value) in fields {
            row.insert(key, value);
        }
        row.insert("updated_at".to_string(), Value::String(timestamp_now()));
        Ok(Value::Object(row.clone()))
    }

    async fn delete(&self, entity: &'static EntityDef, id: &str) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().await;
        let index = table(&tables, entity)
            .iter()
            .position(|row| row_id(row) == Some(id))
            .ok_or_else(|| StoreError::not_found(entity, id))?;

        // Required references block the delete; nullable ones are cleared
        let has_many = entity.relations.iter().filter(|r| r.kind == RelationKind::HasMany);
        for relation in has_many.clone().filter(|r| !nullable_key(r)) {
            let referenced = table(&tables, relation.target_def())
                .iter()
                .any(|child| child.get(relation.foreign_key).and_then(Value::as_str) == Some(id));
            if referenced {
                return Err(DatabaseError::Constraint(format!(
                    "{} {} is still referenced by {}.{}",
                    entity.name, id, relation.target, relation.foreign_key
                ))
                .into());
            }
        }

        let removed = tables.entry(entity.name).or_default().remove(index);
        for relation in has_many.filter(|r| nullable_key(r)) {
            if let Some(children) = tables.get_mut(relation.target) {
                for child in children.iter_mut().filter(|c| c.get(relation.foreign_key).and_then(Value::as_str) == Some(id)) {
                    child.insert(relation.foreign_key.to_string(), Value::Null);
                }
            }
        }

        Ok(Value::Object(removed))
    }

    async fn resource_tenant(&self, entity: &'static EntityDef, id: &str) -> Result<ResourceTenant, StoreError> {
        let tables = self.tables.read().await;
        let Some(row) = table(&tables, entity).iter().find(|row| row_id(row) == Some(id)) else {
            return Ok(ResourceTenant::Missing);
        };
        Ok(match tenant_of(&tables, entity, row) {
            Some(tenant) => ResourceTenant::Tenant(tenant),
            None => ResourceTenant::Unscoped,
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn table<'a>(tables: &'a Tables, entity: &EntityDef) -> &'a [Row] {
    tables.get(entity.name).map(Vec::as_slice).unwrap_or(&[])
}

fn nullable_key(relation: &RelationDef) -> bool {
    relation.target_def().field(relation.foreign_key).is_some_and(|f| f.nullable)
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn tenant_of(tables: &Tables, entity: &EntityDef, row: &Row) -> Option<String> {
    match entity.tenant {
        TenantScope::Column(column) => row.get(column).and_then(value_text),
        TenantScope::Parent { foreign_key, parent } => {
            let parent_id = row.get(foreign_key).and_then(value_text)?;
            let parent_def = crate::entity::by_name(parent)?;
            let parent_row = table(tables, parent_def).iter().find(|r| row_id(r) == Some(parent_id.as_str()))?;
            tenant_of(tables, parent_def, parent_row)
        }
    }
}

fn matches_where(row: &Row, where_input: &WhereInput) -> bool {
    let filters_match = where_input.filters.iter().all(|filter| {
        let actual = row.get(&filter.field).and_then(value_text);
        match &filter.condition {
            Condition::Equals(expected) => actual == value_text(expected),
            Condition::In(values) => values.iter().any(|v| actual.is_some() && actual == value_text(v)),
        }
    });
    if !filters_match {
        return false;
    }

    match &where_input.search {
        None => true,
        Some(search) => {
            let needle = search.term.to_lowercase();
            search.fields.iter().any(|field| {
                row.get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        }
    }
}

fn sort_rows(rows: &mut [&Row], order_by: &[OrderBy]) {
    let default_order = [OrderBy::new("created_at", SortDirection::Desc)];
    let order_by = if order_by.is_empty() { &default_order[..] } else { order_by };

    rows.sort_by(|a, b| {
        for order in order_by {
            let ordering = compare_values(a.get(&order.field), b.get(&order.field));
            let ordering = match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

// Nulls sort as the largest value, matching PostgreSQL's default.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}

fn expand(tables: &Tables, entity: &EntityDef, row: &Row, include: &Include) -> Row {
    let mut out = row.clone();
    let id = row_id(row);

    for name in &include.load {
        let Some(relation) = entity.relation(name) else { continue };
        let target = relation.target_def();
        let value = match relation.kind {
            RelationKind::HasMany => Value::Array(
                table(tables, target)
                    .iter()
                    .filter(|child| id.is_some() && child.get(relation.foreign_key).and_then(Value::as_str) == id)
                    .map(|child| Value::Object(child.clone()))
                    .collect(),
            ),
            RelationKind::BelongsTo => {
                let key = row.get(relation.foreign_key).and_then(value_text);
                key.and_then(|key| table(tables, target).iter().find(|r| row_id(r) == Some(key.as_str())))
                    .map(|parent| Value::Object(parent.clone()))
                    .unwrap_or(Value::Null)
            }
        };
        out.insert(relation.name.to_string(), value);
    }

    if !include.count.is_empty() {
        let mut counts = Map::new();
        for name in &include.count {
            let Some(relation) = entity.relation(name) else { continue };
            let n = table(tables, relation.target_def())
                .iter()
                .filter(|child| id.is_some() && child.get(relation.foreign_key).and_then(Value::as_str) == id)
                .count();
            counts.insert(relation.name.to_string(), Value::from(n));
        }
        out.insert("_count".to_string(), Value::Object(counts));
    }

    out
}

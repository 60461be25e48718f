//! SQL generation for `FindArgs` against the registry tables.
//!
//! Every statement selects `row_to_json(..)` so rows come back as JSON objects
//! keyed by column name. Comparisons cast columns to text, which keeps binds
//! uniform (text or text[]) for uuid and timestamp columns alike.

use serde_json::{Map, Value};
use sqlx::postgres::PgArguments;

use super::store::value_text;
use crate::entity::{EntityDef, FieldType, TenantScope};
use crate::query::{Condition, FindArgs, OrderBy, WhereInput};

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

impl SqlResult {
    /// Bind every parameter onto a plain query
    pub fn bind(&self) -> sqlx::query::Query<'_, sqlx::Postgres, PgArguments> {
        self.params.iter().fold(sqlx::query(&self.query), bind_param)
    }
}

/// Accumulates `WHERE` conditions and their positional parameters.
#[derive(Debug, Default)]
pub struct SqlWhere {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl SqlWhere {
    pub fn new() -> Self {
        Self::default()
    }

    fn param(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub fn filters(&mut self, where_input: &WhereInput) {
        for filter in &where_input.filters {
            let column = quote(&filter.field);
            let sql = match &filter.condition {
                Condition::Equals(Value::Null) => format!("{column} IS NULL"),
                Condition::Equals(value) => {
                    let p = self.param(value.clone());
                    format!("{column}::text = {p}")
                }
                Condition::In(values) if values.is_empty() => "1=0".to_string(),
                Condition::In(values) => {
                    let p = self.param(Value::Array(values.clone()));
                    format!("{column}::text = ANY({p})")
                }
            };
            self.conditions.push(sql);
        }

        if let Some(search) = &where_input.search {
            let pattern = format!("%{}%", escape_like(&search.term));
            let p = self.param(Value::String(pattern));
            let any: Vec<String> = search.fields.iter().map(|f| format!("{} ILIKE {p}", quote(f))).collect();
            self.conditions.push(format!("({})", any.join(" OR ")));
        }
    }

    /// Restrict to rows owned by `tenant_id`, directly or through the parent
    pub fn tenant(&mut self, entity: &EntityDef, tenant_id: &str) {
        let p = self.param(Value::String(tenant_id.to_string()));
        let sql = match entity.tenant {
            TenantScope::Column(column) => format!("{}::text = {p}", quote(column)),
            TenantScope::Parent { foreign_key, parent } => {
                let parent_column = crate::entity::by_name(parent)
                    .and_then(|def| match def.tenant {
                        TenantScope::Column(column) => Some(column),
                        TenantScope::Parent { .. } => None,
                    })
                    .unwrap_or("tenant_id");
                format!(
                    "{} IN (SELECT \"id\" FROM {} WHERE {}::text = {p})",
                    quote(foreign_key),
                    quote(parent),
                    quote(parent_column)
                )
            }
        };
        self.conditions.push(sql);
    }

    pub fn clause(&self) -> String {
        if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

pub fn select_page(entity: &EntityDef, args: &FindArgs, tenant_id: Option<&str>) -> SqlResult {
    let mut sql_where = SqlWhere::new();
    sql_where.filters(&args.where_input);
    if let Some(tenant_id) = tenant_id {
        sql_where.tenant(entity, tenant_id);
    }

    let query = format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE {} ORDER BY {} LIMIT {} OFFSET {}) t",
        quote(entity.name),
        sql_where.clause(),
        order_clause(&args.order_by),
        args.take.max(0),
        args.skip.max(0),
    );
    SqlResult { query, params: sql_where.into_params() }
}

pub fn count(entity: &EntityDef, args: &FindArgs, tenant_id: &str) -> SqlResult {
    let mut sql_where = SqlWhere::new();
    sql_where.filters(&args.where_input);
    sql_where.tenant(entity, tenant_id);

    let query = format!("SELECT COUNT(*) AS count FROM {} WHERE {}", quote(entity.name), sql_where.clause());
    SqlResult { query, params: sql_where.into_params() }
}

pub fn insert(entity: &EntityDef, record: &Map<String, Value>) -> SqlResult {
    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    let mut params = Vec::new();

    for (key, value) in record {
        let Some(field) = entity.field(key) else { continue };
        params.push(value.clone());
        columns.push(quote(field.name));
        placeholders.push(format!("${}{}", params.len(), cast(field.ty)));
    }

    let query = format!(
        "WITH ins AS (INSERT INTO {} ({}) VALUES ({}) RETURNING *) SELECT row_to_json(ins) AS row FROM ins",
        quote(entity.name),
        columns.join(", "),
        placeholders.join(", "),
    );
    SqlResult { query, params }
}

pub fn update(entity: &EntityDef, id: &str, fields: &Map<String, Value>) -> SqlResult {
    let mut params = Vec::new();
    let mut sets = Vec::new();

    for (key, value) in fields {
        let Some(field) = entity.field(key).filter(|f| !f.system) else { continue };
        params.push(value.clone());
        sets.push(format!("{} = ${}{}", quote(field.name), params.len(), cast(field.ty)));
    }
    sets.push("\"updated_at\" = now()".to_string());
    params.push(Value::String(id.to_string()));

    let query = format!(
        "WITH upd AS (UPDATE {} SET {} WHERE \"id\"::text = ${} RETURNING *) SELECT row_to_json(upd) AS row FROM upd",
        quote(entity.name),
        sets.join(", "),
        params.len(),
    );
    SqlResult { query, params }
}

pub fn delete(entity: &EntityDef, id: &str) -> SqlResult {
    SqlResult {
        query: format!(
            "WITH del AS (DELETE FROM {} WHERE \"id\"::text = $1 RETURNING *) SELECT row_to_json(del) AS row FROM del",
            quote(entity.name)
        ),
        params: vec![Value::String(id.to_string())],
    }
}

/// Rows of `target` whose `key` column is one of the bound ids
pub fn select_related(target: &EntityDef, key: &str) -> String {
    format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE {}::text = ANY($1) ORDER BY \"created_at\" ASC) t",
        quote(target.name),
        quote(key)
    )
}

pub fn count_related(target: &EntityDef, key: &str) -> String {
    let key = quote(key);
    format!(
        "SELECT {key}::text AS key, COUNT(*) AS count FROM {} WHERE {key}::text = ANY($1) GROUP BY {key}",
        quote(target.name)
    )
}

/// Tenant owning one record, resolved through the parent when needed
pub fn resource_tenant(entity: &EntityDef, id: &str) -> SqlResult {
    let query = match entity.tenant {
        TenantScope::Column(column) => format!(
            "SELECT {}::text AS tenant FROM {} WHERE \"id\"::text = $1",
            quote(column),
            quote(entity.name)
        ),
        TenantScope::Parent { foreign_key, parent } => format!(
            "SELECT p.\"tenant_id\"::text AS tenant FROM {} c LEFT JOIN {} p ON p.\"id\" = c.{} WHERE c.\"id\"::text = $1",
            quote(entity.name),
            quote(parent),
            quote(foreign_key)
        ),
    };
    SqlResult { query, params: vec![Value::String(id.to_string())] }
}

fn order_clause(order_by: &[OrderBy]) -> String {
    if order_by.is_empty() {
        return "\"created_at\" DESC".to_string();
    }
    order_by
        .iter()
        .map(|o| format!("{} {}", quote(&o.field), o.direction.to_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn cast(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Id => "::uuid",
        FieldType::Timestamp => "::timestamptz",
        FieldType::String => "",
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Array(values) => q.bind(values.iter().filter_map(value_text).collect::<Vec<String>>()),
        other => q.bind(value_text(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::entity::by_name;
    use crate::query::{translate, QueryParams};
    use serde_json::json;

    fn args(entity: &EntityDef, raw: &str) -> FindArgs {
        let config = QueryConfig { default_limit: 20, max_limit: None, debug_logging: false };
        translate(&QueryParams::parse(raw), entity, &config).unwrap()
    }

    #[test]
    fn page_query_scopes_to_tenant() {
        let startup = by_name("startup").unwrap();
        let sql = select_page(startup, &args(startup, "limit=5&offset=10&order=created_at.desc"), Some("t1"));
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"startup\" WHERE \"tenant_id\"::text = $1 \
             ORDER BY \"created_at\" DESC LIMIT 5 OFFSET 10) t"
        );
        assert_eq!(sql.params, vec![json!("t1")]);
    }

    #[test]
    fn filters_and_search_number_params_in_order() {
        let startup = by_name("startup").unwrap();
        let sql = select_page(startup, &args(startup, "user_id=u1&user_id=u2&searchTerm=50%25"), Some("t1"));
        assert!(sql.query.contains("\"user_id\"::text = ANY($1)"));
        assert!(sql.query.contains("(\"description\" ILIKE $2 OR \"image\" ILIKE $2 OR \"name\" ILIKE $2)"));
        assert!(sql.query.contains("\"tenant_id\"::text = $3"));
        assert_eq!(sql.params[1], json!("%50\\%%"));
    }

    #[test]
    fn staff_scope_through_startup() {
        let analyst = by_name("data_analyst").unwrap();
        let sql = count(analyst, &args(analyst, ""), "t1");
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) AS count FROM \"data_analyst\" WHERE \"startup_id\" IN \
             (SELECT \"id\" FROM \"startup\" WHERE \"tenant_id\"::text = $1)"
        );
    }

    #[test]
    fn detail_lookup_is_unscoped_and_defaults_order() {
        let startup = by_name("startup").unwrap();
        let sql = select_page(startup, &args(startup, "id=abc"), None);
        assert!(sql.query.contains("WHERE \"id\"::text = $1 ORDER BY \"created_at\" DESC"));
    }

    #[test]
    fn insert_casts_typed_columns() {
        let analyst = by_name("data_analyst").unwrap();
        let record = json!({ "id": "a", "created_at": "2024-01-01T00:00:00Z", "user_id": null });
        let Value::Object(record) = record else { unreachable!() };
        let sql = insert(analyst, &record);
        assert!(sql.query.contains("(\"created_at\", \"id\", \"user_id\") VALUES ($1::timestamptz, $2::uuid, $3::uuid)"));
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn update_touches_updated_at() {
        let startup = by_name("startup").unwrap();
        let Value::Object(fields) = json!({ "name": "Acme", "id": "ignored" }) else { unreachable!() };
        let sql = update(startup, "s1", &fields);
        assert!(sql.query.contains("SET \"name\" = $1, \"updated_at\" = now() WHERE \"id\"::text = $2"));
        assert_eq!(sql.params, vec![json!("Acme"), json!("s1")]);
    }

    #[test]
    fn null_equality_and_quoting() {
        let mut sql_where = SqlWhere::new();
        let mut where_input = WhereInput::default();
        where_input.equals("startup_id", Value::Null);
        sql_where.filters(&where_input);
        assert_eq!(sql_where.clause(), "\"startup_id\" IS NULL");
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }
}

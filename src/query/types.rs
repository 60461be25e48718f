use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Map, Value};

use super::error::QueryError;
use crate::entity::EntityDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc`/`descending` in any case is descending, every other word ascending
    pub fn parse(word: &str) -> Self {
        if word.eq_ignore_ascii_case("desc") || word.eq_ignore_ascii_case("descending") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn is_direction_word(word: &str) -> bool {
        ["asc", "desc", "ascending", "descending"]
            .iter()
            .any(|w| w.eq_ignore_ascii_case(word))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    In(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub condition: Condition,
}

/// Case-insensitive substring match OR-ed across `fields`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    pub term: String,
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereInput {
    pub filters: Vec<FieldFilter>,
    pub search: Option<SearchFilter>,
}

impl WhereInput {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.search.is_none()
    }

    pub fn equals(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.filters.push(FieldFilter { field: field.into(), condition: Condition::Equals(value.into()) });
    }
}

/// Relation expansion: full records vs. count-only aggregation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Include {
    pub load: Vec<&'static str>,
    pub count: Vec<&'static str>,
}

impl Include {
    pub fn is_empty(&self) -> bool {
        self.load.is_empty() && self.count.is_empty()
    }
}

/// Normalized request consumed by the data layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FindArgs {
    pub where_input: WhereInput,
    pub include: Include,
    pub order_by: Vec<OrderBy>,
    pub take: i64,
    pub skip: i64,
}

impl FindArgs {
    /// Every filter and order column must exist on the entity. The translator
    /// passes unknown keys through; this is the gate the data layer applies.
    pub fn check_columns(&self, entity: &EntityDef) -> Result<(), QueryError> {
        let filter_fields = self.where_input.filters.iter().map(|f| f.field.as_str());
        let order_fields = self.order_by.iter().map(|o| o.field.as_str());
        for field in filter_fields.chain(order_fields) {
            if !entity.has_column(field) {
                return Err(QueryError::UnknownField {
                    entity: entity.name.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Serialize for WhereInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for filter in &self.filters {
            match &filter.condition {
                Condition::Equals(value) => map.serialize_entry(&filter.field, value)?,
                Condition::In(values) => map.serialize_entry(&filter.field, &json!({ "in": values }))?,
            }
        }
        if let Some(search) = &self.search {
            let or: Vec<Value> = search
                .fields
                .iter()
                .map(|field| json!({ *field: { "contains": search.term, "mode": "insensitive" } }))
                .collect();
            map.serialize_entry("OR", &or)?;
        }
        map.end()
    }
}

impl Serialize for Include {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for relation in &self.load {
            map.serialize_entry(relation, &true)?;
        }
        if !self.count.is_empty() {
            let select: Map<String, Value> = self.count.iter().map(|r| (r.to_string(), Value::Bool(true))).collect();
            map.serialize_entry("_count", &json!({ "select": select }))?;
        }
        map.end()
    }
}

impl Serialize for OrderBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, self.direction.as_str())?;
        map.end()
    }
}

impl Serialize for FindArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.where_input.is_empty() {
            map.serialize_entry("where", &self.where_input)?;
        }
        if !self.include.is_empty() {
            map.serialize_entry("include", &self.include)?;
        }
        if !self.order_by.is_empty() {
            map.serialize_entry("orderBy", &self.order_by)?;
        }
        map.serialize_entry("take", &self.take)?;
        map.serialize_entry("skip", &self.skip)?;
        map.end()
    }
}

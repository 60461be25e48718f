use serde_json::Value;

use super::error::QueryError;
use super::order::QueryOrder;
use super::params::QueryParams;
use super::types::{Condition, FieldFilter, FindArgs, Include, SearchFilter, WhereInput};
use crate::config::QueryConfig;
use crate::entity::EntityDef;

pub const LIMIT: &str = "limit";
pub const OFFSET: &str = "offset";
pub const ORDER: &str = "order";
pub const SEARCH_TERM: &str = "searchTerm";
pub const RELATIONS: &str = "relations";

const COUNT_SUFFIX: &str = ".count";

/// Translate flat query parameters into the request shape the data layer
/// executes. Pure: no I/O, no config lookups beyond the values passed in.
///
/// Any key that is not one of the recognized parameters becomes an equality
/// filter (several values become an `in` filter). Column existence is not
/// checked here; see [`FindArgs::check_columns`].
pub fn translate(params: &QueryParams, entity: &EntityDef, config: &QueryConfig) -> Result<FindArgs, QueryError> {
    let take = parse_limit(params.first(LIMIT), config);
    let skip = parse_offset(params.first(OFFSET));
    let order_by = QueryOrder::parse_all(params.all(ORDER))?;
    let include = parse_relations(params.all(RELATIONS), entity)?;

    let mut where_input = WhereInput::default();
    for (key, values) in params.iter() {
        if matches!(key, LIMIT | OFFSET | ORDER | SEARCH_TERM | RELATIONS) {
            continue;
        }
        let condition = match values {
            [single] => Condition::Equals(Value::String(single.clone())),
            many => Condition::In(many.iter().cloned().map(Value::String).collect()),
        };
        where_input.filters.push(FieldFilter { field: key.to_string(), condition });
    }

    if let Some(term) = params.first(SEARCH_TERM).map(str::trim).filter(|t| !t.is_empty()) {
        let fields = entity.searchable_fields();
        if fields.is_empty() {
            tracing::debug!("searchTerm ignored: {} has no searchable fields", entity.name);
        } else {
            where_input.search = Some(SearchFilter { term: term.to_string(), fields });
        }
    }

    let args = FindArgs { where_input, include, order_by, take, skip };
    if config.debug_logging {
        tracing::debug!(
            entity = entity.name,
            args = %serde_json::to_string(&args).unwrap_or_default(),
            "translated query"
        );
    }
    Ok(args)
}

fn parse_limit(raw: Option<&str>, config: &QueryConfig) -> i64 {
    let limit = match raw.and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(v) if v > 0 => v,
        _ => config.default_limit,
    };
    match config.max_limit {
        Some(max) if limit > max => {
            if config.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
            }
            max
        }
        _ => limit,
    }
}

fn parse_offset(raw: Option<&str>) -> i64 {
    match raw.and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(v) if v >= 0 => v,
        _ => 0,
    }
}

fn parse_relations(values: &[String], entity: &EntityDef) -> Result<Include, QueryError> {
    let mut include = Include::default();
    let hints = values.iter().flat_map(|v| v.split(',')).map(str::trim).filter(|h| !h.is_empty());
    for hint in hints {
        let (name, count_only) = match hint.strip_suffix(COUNT_SUFFIX) {
            Some(name) => (name, true),
            None => (hint, false),
        };
        let relation = entity.relation(name).ok_or_else(|| QueryError::UnknownRelation {
            entity: entity.name.to_string(),
            relation: name.to_string(),
        })?;
        if count_only {
            if !relation.is_to_many() {
                return Err(QueryError::NotCountable(name.to_string()));
            }
            if !include.count.contains(&relation.name) {
                include.count.push(relation.name);
            }
        } else if !include.load.contains(&relation.name) {
            include.load.push(relation.name);
        }
    }
    Ok(include)
}

//! Typed views of the admin entities for the client SDK and tests.
//!
//! The server works on JSON records straight from the registry; these structs
//! give callers a typed surface. Relation fields and `_count` are only present
//! when the request asked for them through `relations`.

mod entities;

pub use entities::*;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(rename = "totalCount")]
    pub total_count: i64,
}

/// Per-relation counts requested with `relations=<name>.count`
pub type RelationCounts = BTreeMap<String, i64>;

/// A model served under `/api/{ROUTE}`
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    const ENTITY: &'static str;
    const ROUTE: &'static str;
}

//! Nested-create instructions built from a validated create payload.

use serde_json::{Map, Value};

use crate::entity::{EntityDef, RelationDef, RelationKind};

#[derive(Debug, Clone)]
pub struct ChildCreate {
    pub relation: &'static RelationDef,
    pub records: Vec<Map<String, Value>>,
}

/// A parent row plus the child rows to insert with it
#[derive(Debug, Clone)]
pub struct CreateInput {
    pub fields: Map<String, Value>,
    pub children: Vec<ChildCreate>,
}

impl CreateInput {
    /// Split a validated payload: scalar columns stay on the parent, each
    /// non-empty has-many array becomes a child-create instruction. The child
    /// foreign key is filled in by the store once the parent id exists.
    pub fn from_payload(entity: &EntityDef, payload: Map<String, Value>) -> Self {
        let mut fields = Map::new();
        let mut children = Vec::new();

        for (key, value) in payload {
            match entity.relation(&key) {
                Some(relation) if relation.kind == RelationKind::HasMany => {
                    let records: Vec<Map<String, Value>> = match value {
                        Value::Array(items) => items
                            .into_iter()
                            .filter_map(|item| match item {
                                Value::Object(map) => Some(map),
                                _ => None,
                            })
                            .collect(),
                        _ => Vec::new(),
                    };
                    if !records.is_empty() {
                        children.push(ChildCreate { relation, records });
                    }
                }
                Some(_) => {}
                None => {
                    fields.insert(key, value);
                }
            }
        }

        Self { fields, children }
    }

    pub fn child_count(&self) -> usize {
        self.children.iter().map(|c| c.records.len()).sum()
    }
}

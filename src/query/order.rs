use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::QueryError;
use super::types::{OrderBy, SortDirection};

/// A JSON `order` value. Objects keep their keys in input order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrderJson {
    List(Vec<OrderJson>),
    Text(String),
    Object(OrderedObject),
}

#[derive(Debug)]
struct OrderedObject(Vec<(String, Value)>);

impl OrderedObject {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<'de> Deserialize<'de> for OrderedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectVisitor;

        impl<'de> Visitor<'de> for ObjectVisitor {
            type Value = OrderedObject;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an order object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(OrderedObject(entries))
            }
        }

        deserializer.deserialize_map(ObjectVisitor)
    }
}

pub struct QueryOrder;

impl QueryOrder {
    /// Parse every `order` value, keeping input order across and within values.
    pub fn parse_all(values: &[String]) -> Result<Vec<OrderBy>, QueryError> {
        let mut out = Vec::new();
        for value in values {
            out.extend(Self::parse(value)?);
        }
        Ok(out)
    }

    pub fn parse(value: &str) -> Result<Vec<OrderBy>, QueryError> {
        let trimmed = value.trim();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let json: OrderJson = serde_json::from_str(trimmed)?;
            return Self::parse_json(&json);
        }
        Ok(Self::parse_order_string(trimmed))
    }

    fn parse_json(value: &OrderJson) -> Result<Vec<OrderBy>, QueryError> {
        match value {
            OrderJson::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(Self::parse_json(item)?);
                }
                Ok(out)
            }
            OrderJson::Text(s) => Ok(Self::parse_order_string(s)),
            OrderJson::Object(obj) => {
                // { "id": "created_at", "desc": true } from the table widget.
                // { "id": "desc" } is the field/direction form for the id column.
                if let Some(Value::String(id)) = obj.get("id") {
                    let desc = obj.get("desc").and_then(Value::as_bool);
                    if desc.is_some() || !SortDirection::is_direction_word(id) {
                        let direction = if desc.unwrap_or(false) { SortDirection::Desc } else { SortDirection::Asc };
                        return Ok(vec![OrderBy::new(id.clone(), direction)]);
                    }
                }
                // { "field": "name", "direction": "asc" }
                if let Some(Value::String(field)) = obj.get("field") {
                    let direction = obj
                        .get("direction")
                        .and_then(Value::as_str)
                        .map(SortDirection::parse)
                        .unwrap_or(SortDirection::Asc);
                    return Ok(vec![OrderBy::new(field.clone(), direction)]);
                }
                // { "created_at": "desc", "name": "asc" }
                let mut out = Vec::new();
                for (field, direction) in &obj.0 {
                    let direction = direction.as_str().map(SortDirection::parse).ok_or_else(|| {
                        QueryError::InvalidOrder(format!("direction for '{}' must be a string", field))
                    })?;
                    out.push(OrderBy::new(field.clone(), direction));
                }
                Ok(out)
            }
        }
    }

    /// `created_at.desc,name` / `created_at desc, name asc`
    fn parse_order_string(s: &str) -> Vec<OrderBy> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut words = trimmed.split_whitespace();
            let Some(head) = words.next() else { continue };
            if let Some(dir) = words.next() {
                out.push(OrderBy::new(head, SortDirection::parse(dir)));
                continue;
            }
            match head.rsplit_once('.') {
                Some((field, dir)) if !field.is_empty() && SortDirection::is_direction_word(dir) => {
                    out.push(OrderBy::new(field, SortDirection::parse(dir)));
                }
                _ => out.push(OrderBy::new(head, SortDirection::Asc)),
            }
        }
        out
    }
}

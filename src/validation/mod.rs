//! Declarative payload validation.
//!
//! Each entity's schema is its field table in the registry: a field name mapped
//! to `type`, `required` and `nullable` tags. Validation is a pure function that
//! either returns the normalized payload or every field problem at once.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::entity::{EntityDef, FieldDef, FieldType, RelationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Full payload; required fields enforced, child collections allowed
    Create,
    /// Partial replacement; nothing required, relations rejected
    Update,
    /// Child of a nested create; the parent foreign key is filled in later
    NestedCreate { parent_key: &'static str },
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), field_errors: BTreeMap::new() }
    }

    pub fn field(field: impl Into<String>, problem: impl Into<String>) -> Self {
        let mut error = Self::new("Validation failed");
        error.field_errors.insert(field.into(), problem.into());
        error
    }
}

/// Validate `payload` against `entity`'s schema.
pub fn validate(entity: &EntityDef, payload: &Value, mode: ValidationMode) -> Result<Map<String, Value>, ValidationError> {
    let Value::Object(input) = payload else {
        return Err(ValidationError::new(format!("{} payload must be a JSON object", entity.name)));
    };

    let mut errors = BTreeMap::new();
    let mut normalized = Map::new();
    validate_into(entity, input, mode, "", &mut normalized, &mut errors);

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(ValidationError {
            message: format!("{} validation failed", entity.name),
            field_errors: errors,
        })
    }
}

fn validate_into(
    entity: &EntityDef,
    input: &Map<String, Value>,
    mode: ValidationMode,
    prefix: &str,
    normalized: &mut Map<String, Value>,
    errors: &mut BTreeMap<String, String>,
) {
    for (key, value) in input {
        let path = format!("{prefix}{key}");

        if let Some(field) = entity.field(key) {
            if field.system {
                errors.insert(path, "is generated by the server and cannot be set".to_string());
                continue;
            }
            if matches!(mode, ValidationMode::NestedCreate { parent_key } if parent_key == field.name) {
                errors.insert(path, "is set from the parent record".to_string());
                continue;
            }
            match check_scalar(field, value) {
                Ok(()) => {
                    normalized.insert(key.clone(), value.clone());
                }
                Err(problem) => {
                    errors.insert(path, problem);
                }
            }
            continue;
        }

        if let Some(relation) = entity.relation(key) {
            if mode != ValidationMode::Create || relation.kind != RelationKind::HasMany {
                errors.insert(path, "related records cannot be written here".to_string());
                continue;
            }
            let children = match value {
                Value::Null => continue,
                Value::Array(items) if items.is_empty() => continue,
                Value::Array(items) => items,
                _ => {
                    errors.insert(path, "must be an array of objects".to_string());
                    continue;
                }
            };
            let target = relation.target_def();
            let child_mode = ValidationMode::NestedCreate { parent_key: relation.foreign_key };
            let mut out = Vec::with_capacity(children.len());
            for (index, child) in children.iter().enumerate() {
                let child_prefix = format!("{path}[{index}].");
                let Value::Object(child_input) = child else {
                    errors.insert(format!("{path}[{index}]"), "must be an object".to_string());
                    continue;
                };
                let mut child_normalized = Map::new();
                validate_into(target, child_input, child_mode, &child_prefix, &mut child_normalized, errors);
                check_required(target, child_input, child_mode, &child_prefix, errors);
                out.push(Value::Object(child_normalized));
            }
            normalized.insert(key.clone(), Value::Array(out));
            continue;
        }

        errors.insert(path, "is not a recognized field".to_string());
    }

    if prefix.is_empty() {
        check_required(entity, input, mode, prefix, errors);
    }
}

fn check_required(
    entity: &EntityDef,
    input: &Map<String, Value>,
    mode: ValidationMode,
    prefix: &str,
    errors: &mut BTreeMap<String, String>,
) {
    if mode == ValidationMode::Update {
        return;
    }
    for field in entity.writable_fields().filter(|f| f.required) {
        if let ValidationMode::NestedCreate { parent_key } = mode {
            if parent_key == field.name {
                continue;
            }
        }
        if !input.contains_key(field.name) {
            errors.insert(format!("{prefix}{}", field.name), "is required".to_string());
        }
    }
}

fn check_scalar(field: &FieldDef, value: &Value) -> Result<(), String> {
    match value {
        Value::Null if field.nullable => Ok(()),
        Value::Null => Err("must not be null".to_string()),
        Value::String(s) => match field.ty {
            FieldType::Id if s.trim().is_empty() => Err("must not be empty".to_string()),
            FieldType::String if field.required && s.trim().is_empty() => Err("must not be empty".to_string()),
            FieldType::Timestamp if chrono::DateTime::parse_from_rfc3339(s).is_err() => {
                Err("must be an RFC 3339 timestamp".to_string())
            }
            _ => Ok(()),
        },
        _ => Err("must be a string".to_string()),
    }
}

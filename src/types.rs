/// Shared types used across the codebase

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Logical operations checked against the access collaborator.
/// Every REST method maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessOperation {
    Read,
    Create,
    Update,
    Delete,
}

impl AccessOperation {
    /// GET → READ, POST → CREATE, PUT → UPDATE, DELETE → DELETE.
    /// Anything else is not an operation; callers answer 405.
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(AccessOperation::Read),
            Method::POST => Some(AccessOperation::Create),
            Method::PUT => Some(AccessOperation::Update),
            Method::DELETE => Some(AccessOperation::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessOperation::Read => "READ",
            AccessOperation::Create => "CREATE",
            AccessOperation::Update => "UPDATE",
            AccessOperation::Delete => "DELETE",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, AccessOperation::Read)
    }
}

impl std::fmt::Display for AccessOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

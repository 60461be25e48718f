use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid order specification: {0}")]
    InvalidOrder(String),

    #[error("Unknown relation '{relation}' on {entity}")]
    UnknownRelation { entity: String, relation: String },

    #[error("Relation '{0}' is not a collection and cannot be counted")]
    NotCountable(String),

    #[error("Unknown field '{field}' on {entity}")]
    UnknownField { entity: String, field: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl QueryError {
    /// Query parameter the error should be reported against
    pub fn parameter(&self) -> &str {
        match self {
            QueryError::InvalidOrder(_) | QueryError::JsonError(_) => "order",
            QueryError::UnknownRelation { .. } | QueryError::NotCountable(_) => "relations",
            QueryError::UnknownField { field, .. } => field,
        }
    }
}

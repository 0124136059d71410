//! The error taxonomy surfaced at the crate boundary.
//!
//! Parse and reference errors fail the whole call; data-absence (a missing
//! property, a type mismatch in a comparison, a nonexistent start id) is
//! never an error — it silently suppresses the affected row or comparison.

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String },

    #[error("invalid start type `{start_type}`")]
    InvalidStartType { start_type: String },

    #[error("query cancelled")]
    Cancelled,

    #[error("result exceeded row limit of {limit}")]
    ResultTooLarge { limit: usize },

    #[error("missing endpoint node `{id}` for edge insertion")]
    MissingEndpoint { id: String },

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

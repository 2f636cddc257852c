use crate::id::ShapeId;
use thiserror::Error;

/// Invalid shape parameters and identity violations.
///
/// Raised before any mutation, so a failed operation leaves the shape as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("radius cannot be zero")]
    ZeroRadius,
    #[error("scale cannot be zero")]
    ZeroScale,
    #[error("shape `{0}` is already registered")]
    DuplicateId(ShapeId),
    #[error("shape `{0}` is not a group")]
    NotAGroup(ShapeId),
}

/// Malformed wire payloads. Fatal to the message being decoded only.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown shape type `{0}`")]
    UnknownType(String),
    #[error("{kind} is missing field `{field}`")]
    MissingField { kind: String, field: &'static str },
    #[error("{kind} field `{field}` must be {expected}")]
    InvalidField {
        kind: String,
        field: &'static str,
        expected: &'static str,
    },
    #[error("malformed wire payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

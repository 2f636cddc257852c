use sd_core::{DecodeError, Point, ShapeId};
use thiserror::Error;

/// A command was applied or undone against a drawing that does not match
/// its recorded expectations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("cannot add again: shape `{0}` is already in the drawing")]
    AlreadyPresent(ShapeId),
    #[error("cannot remove: shape `{0}` is not in the drawing")]
    NotPresent(ShapeId),
    #[error("invalid: center of `{id}` does not match {actual} != {expected}")]
    CenterMismatch {
        id: ShapeId,
        expected: Point,
        actual: Point,
    },
}

/// The outbound half of a connection went away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport closed: {0}")]
pub struct TransportError(pub String);

/// Failures of the replicated log.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

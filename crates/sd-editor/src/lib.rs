//! Editing model: the drawing, reversible commands, and the two logs that
//! record them (local `Log` and server-backed `ReplicatedLog`).

pub mod codec;
pub mod commands;
pub mod drawing;
pub mod error;
pub mod history;
pub mod observer;
pub mod protocol;
pub mod replicated;

pub use codec::WireCommand;
pub use commands::{
    Command, CommandKind, move_shape_command, null_command, remove_shape_command,
    sequence_command, undo_command,
};
pub use drawing::Drawing;
pub use error::{CommandError, SyncError, TransportError};
pub use history::{History, Log, LogUndoPolicy};
pub use observer::ObserverId;
pub use protocol::{ClientMessage, ServerMessage, UserId};
pub use replicated::{ReplicaConfig, ReplicaEvent, ReplicatedLog, Transport};

//! Client/server messages.
//!
//! One JSON object per message, discriminated by `type`. On a stream each
//! message is a single line.

use crate::codec::WireCommand;
use sd_core::{DecodeError, Point, WireShape};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection identity assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask the server to apply `command`. `seq` is echoed back in the
    /// matching `change` or `response`.
    Request { seq: u64, command: WireCommand },
    /// Presence only; never logged.
    Pointer { position: Point },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Identify {
        user: UserId,
    },
    /// Shapes in the authoritative drawing at join time, bottom to top.
    Snapshot {
        shapes: Vec<WireShape>,
    },
    /// A confirmed command, broadcast to everyone including the requester.
    Change {
        command: WireCommand,
        user: UserId,
        seq: u64,
    },
    /// A rejected request, sent to the requester only. `command` is absent
    /// when the request's command could not be decoded at all.
    Response {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<WireCommand>,
        reason: String,
        seq: u64,
    },
    Pointer {
        position: Point,
        user: UserId,
    },
}

/// Encode a message as a single line of JSON, without the trailing newline.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, DecodeError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode one line of JSON.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, DecodeError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

/// The `seq` of a line tagged as a `request`, even when its command is
/// malformed. Lets the server answer a request it cannot decode.
pub fn request_seq(line: &str) -> Option<u64> {
    #[derive(Deserialize)]
    struct Header {
        #[serde(rename = "type")]
        kind: String,
        seq: u64,
    }

    let header: Header = serde_json::from_str(line.trim_end()).ok()?;
    (header.kind == "request").then_some(header.seq)
}

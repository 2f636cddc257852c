//! The authoritative drawing and its request handling.
//!
//! `ServerSession` is synchronous and transport-agnostic: the network loop
//! feeds it one client message at a time and routes whatever it returns.
//! The order in which `handle` is called is the order of the shared history.

use crate::config::ServerConfig;
use sd_core::ShapeRegistry;
use sd_editor::{
    ClientMessage, Drawing, Log, LogUndoPolicy, ServerMessage, SyncError, UserId, WireCommand,
};
use std::collections::BTreeSet;

/// A message and who should receive it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    ToUser(UserId, ServerMessage),
    Broadcast(ServerMessage),
    BroadcastExcept(UserId, ServerMessage),
}

impl Outgoing {
    pub fn message(&self) -> &ServerMessage {
        match self {
            Outgoing::ToUser(_, m) | Outgoing::Broadcast(m) | Outgoing::BroadcastExcept(_, m) => m,
        }
    }

    /// Whether `user` is a recipient.
    pub fn includes(&self, user: &UserId) -> bool {
        match self {
            Outgoing::ToUser(to, _) => to == user,
            Outgoing::Broadcast(_) => true,
            Outgoing::BroadcastExcept(skip, _) => skip != user,
        }
    }
}

pub struct ServerSession {
    log: Log,
    registry: ShapeRegistry,
    users: BTreeSet<UserId>,
    next_user: u64,
}

impl ServerSession {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_policy(config.policy)
    }

    pub fn with_policy(policy: LogUndoPolicy) -> Self {
        Self {
            log: Log::with_policy(Drawing::new(), policy),
            registry: ShapeRegistry::new(),
            users: BTreeSet::new(),
            next_user: 1,
        }
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn drawing(&self) -> &Drawing {
        self.log.drawing()
    }

    pub fn users(&self) -> impl Iterator<Item = &UserId> {
        self.users.iter()
    }

    /// Register a new connection. Returns its id and the greeting to send
    /// it: `identify`, then a `snapshot` of the current drawing.
    pub fn connect(&mut self) -> (UserId, Vec<ServerMessage>) {
        let user = UserId(format!("user-{}", self.next_user));
        self.next_user += 1;
        self.users.insert(user.clone());
        let shapes = self.drawing().iter().map(|s| s.to_wire()).collect();
        let greeting = vec![
            ServerMessage::Identify { user: user.clone() },
            ServerMessage::Snapshot { shapes },
        ];
        (user, greeting)
    }

    pub fn disconnect(&mut self, user: &UserId) {
        self.users.remove(user);
    }

    pub fn handle(&mut self, user: &UserId, message: ClientMessage) -> Vec<Outgoing> {
        match message {
            ClientMessage::Request { seq, command } => match self.apply(&command) {
                Ok(()) => {
                    log::debug!("{user}: request #{seq} confirmed");
                    vec![Outgoing::Broadcast(ServerMessage::Change {
                        command,
                        user: user.clone(),
                        seq,
                    })]
                }
                Err(err) => {
                    log::warn!("{user}: request #{seq} rejected: {err}");
                    vec![Outgoing::ToUser(
                        user.clone(),
                        ServerMessage::Response {
                            command: Some(command),
                            reason: err.to_string(),
                            seq,
                        },
                    )]
                }
            },
            ClientMessage::Pointer { position } => vec![Outgoing::BroadcastExcept(
                user.clone(),
                ServerMessage::Pointer {
                    position,
                    user: user.clone(),
                },
            )],
        }
    }

    /// Answer request `seq` whose command could not be decoded.
    pub fn reject_malformed(&self, user: &UserId, seq: u64, reason: String) -> Vec<Outgoing> {
        log::warn!("{user}: request #{seq} is malformed: {reason}");
        vec![Outgoing::ToUser(
            user.clone(),
            ServerMessage::Response {
                command: None,
                reason,
                seq,
            },
        )]
    }

    fn apply(&mut self, wire: &WireCommand) -> Result<(), SyncError> {
        let command = wire.decode(&mut self.registry)?;
        self.log.add(command)?;
        Ok(())
    }
}

impl Default for ServerSession {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

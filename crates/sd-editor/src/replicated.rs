//! A log whose history is owned by the server.
//!
//! `ReplicatedLog` never commits anything on its own. Edits are sent as
//! `request` messages and enter the history only when the server broadcasts
//! them back as `change`. Every connected replica applies the same changes
//! in the same order, so their drawings agree.
//!
//! Calling contract for `log`: the caller has already applied the command to
//! `drawing_mut()` (a speculative preview, e.g. while dragging). `log` undoes
//! that preview before transmitting; the command is applied for real when
//! its `change` arrives.
//!
//! Outstanding requests are tracked by `seq`. Nothing is retried: a request
//! that is neither confirmed nor rejected within `request_timeout` is
//! cancelled by `expire_pending`.
//!
//! Undo and redo operate on this replica's own confirmed edits, newest
//! first, by requesting the inverse command. Like any request, the inverse
//! is rejected if another user has since moved the shape.

use crate::codec::WireCommand;
use crate::commands::{Command, undo_command};
use crate::drawing::Drawing;
use crate::error::{SyncError, TransportError};
use crate::history::{History, Log};
use crate::protocol::{ClientMessage, ServerMessage, UserId};
use sd_core::{Point, ShapeRegistry};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Outbound half of a server connection.
pub trait Transport {
    fn send(&mut self, message: ClientMessage) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaConfig {
    /// How long a request may stay unanswered before `expire_pending`
    /// cancels it.
    pub request_timeout: Duration,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// What a server message did to the replica.
#[derive(Debug)]
pub enum ReplicaEvent {
    Identified(UserId),
    /// Shapes from a join-time snapshot that were not already present.
    Synced { added: usize },
    /// A confirmed command was applied and logged.
    Changed {
        command: Command,
        user: UserId,
        own: bool,
    },
    /// Our request `seq` was refused. `command` is what we sent, unless the
    /// request had already expired.
    Rejected {
        command: Option<Command>,
        reason: String,
        seq: u64,
    },
    Pointer { user: UserId, position: Point },
}

#[derive(Debug)]
enum Origin {
    Edit,
    /// Holds the own edit being undone.
    Undo(Command),
    Redo,
}

#[derive(Debug)]
struct Pending {
    sent: Command,
    origin: Origin,
    sent_at: Instant,
    /// Fresh edits sent before this request.
    generation: u64,
}

pub struct ReplicatedLog<T: Transport> {
    base: Log,
    registry: ShapeRegistry,
    transport: T,
    config: ReplicaConfig,
    user: Option<UserId>,
    next_seq: u64,
    /// Count of fresh edits sent. An undo or redo that settles after a newer
    /// edit must not refill the redo stack.
    edits: u64,
    pending: BTreeMap<u64, Pending>,
    /// Own confirmed edits, newest last.
    own: Vec<Command>,
    /// Own edits whose undo was confirmed, newest last.
    redo: Vec<Command>,
}

impl<T: Transport> ReplicatedLog<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ReplicaConfig::default())
    }

    pub fn with_config(transport: T, config: ReplicaConfig) -> Self {
        Self {
            base: Log::new(Drawing::new()),
            registry: ShapeRegistry::new(),
            transport,
            config,
            user: None,
            next_seq: 1,
            edits: 0,
            pending: BTreeMap::new(),
            own: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// The id the server assigned, once `identify` has arrived.
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Confirmed history, in server order.
    pub fn history(&self) -> &Log {
        &self.base
    }

    pub fn drawing(&self) -> &Drawing {
        self.base.drawing()
    }

    pub fn drawing_mut(&mut self) -> &mut Drawing {
        self.base.drawing_mut()
    }

    /// Shapes created locally must come from here so that the server's echo
    /// resolves to the same instances.
    pub fn registry_mut(&mut self) -> &mut ShapeRegistry {
        &mut self.registry
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    /// Number of requests awaiting a `change` or `response`.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.own.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    // ─── Outbound ───────────────────────────────────────────────────────

    /// Send `command` to the server without touching local state.
    /// Returns the request's `seq`.
    pub fn add(&mut self, command: Command) -> Result<u64, SyncError> {
        let seq = self.request(command, Origin::Edit)?;
        self.edits += 1;
        self.redo.clear();
        Ok(seq)
    }

    /// Withdraw the caller's speculative application of `command`, then
    /// send it. If the drawing does not hold the speculative state the
    /// precondition error is returned and nothing is sent.
    pub fn log(&mut self, command: Command) -> Result<u64, SyncError> {
        command.undo(self.base.drawing_mut())?;
        self.add(command)
    }

    /// Request the inverse of this replica's newest own edit.
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, SyncError> {
        let Some(edit) = self.own.pop() else {
            return Ok(false);
        };
        match self.request(undo_command(&edit), Origin::Undo(edit.clone())) {
            Ok(_) => Ok(true),
            Err(err) => {
                self.own.push(edit);
                Err(err)
            }
        }
    }

    /// Re-send the edit most recently undone by `undo`.
    pub fn redo(&mut self) -> Result<bool, SyncError> {
        let Some(edit) = self.redo.pop() else {
            return Ok(false);
        };
        match self.request(edit.clone(), Origin::Redo) {
            Ok(_) => Ok(true),
            Err(err) => {
                self.redo.push(edit);
                Err(err)
            }
        }
    }

    /// Share the local pointer position with the other users.
    pub fn pointer(&mut self, position: Point) -> Result<(), SyncError> {
        Ok(self.transport.send(ClientMessage::Pointer { position })?)
    }

    fn request(&mut self, sent: Command, origin: Origin) -> Result<u64, SyncError> {
        let seq = self.next_seq;
        self.transport.send(ClientMessage::Request {
            seq,
            command: sent.to_wire(),
        })?;
        self.next_seq += 1;
        log::debug!("replica: request #{seq} sent ({origin:?})");
        self.pending.insert(
            seq,
            Pending {
                sent,
                origin,
                sent_at: Instant::now(),
                generation: self.edits,
            },
        );
        Ok(seq)
    }

    /// Cancel every request sent more than `request_timeout` before `now`.
    /// Returns the cancelled commands, oldest first.
    pub fn expire_pending(&mut self, now: Instant) -> Vec<Command> {
        let timeout = self.config.request_timeout;
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.sent_at) >= timeout)
            .map(|(seq, _)| *seq)
            .collect();
        let mut cancelled = Vec::with_capacity(expired.len());
        for seq in expired {
            if let Some(pending) = self.pending.remove(&seq) {
                log::warn!("replica: request #{seq} expired after {timeout:?}");
                cancelled.push(self.withdraw(pending));
            }
        }
        cancelled
    }

    // ─── Inbound ────────────────────────────────────────────────────────

    pub fn handle(&mut self, message: ServerMessage) -> Result<ReplicaEvent, SyncError> {
        match message {
            ServerMessage::Identify { user } => {
                log::info!("replica: identified as {user}");
                self.user = Some(user.clone());
                Ok(ReplicaEvent::Identified(user))
            }
            ServerMessage::Snapshot { shapes } => {
                let mut added = 0;
                for wire in &shapes {
                    let shape = self.registry.decode(wire)?;
                    if !self.base.drawing().contains(&shape) {
                        self.base.drawing_mut().add(shape);
                        added += 1;
                    }
                }
                Ok(ReplicaEvent::Synced { added })
            }
            ServerMessage::Change { command, user, seq } => self.on_change(&command, user, seq),
            ServerMessage::Response {
                command: _,
                reason,
                seq,
            } => {
                log::warn!("replica: request #{seq} rejected: {reason}");
                let command = self.pending.remove(&seq).map(|p| self.withdraw(p));
                Ok(ReplicaEvent::Rejected {
                    command,
                    reason,
                    seq,
                })
            }
            ServerMessage::Pointer { position, user } => Ok(ReplicaEvent::Pointer { user, position }),
        }
    }

    fn on_change(
        &mut self,
        wire: &WireCommand,
        user: UserId,
        seq: u64,
    ) -> Result<ReplicaEvent, SyncError> {
        let command = wire.decode(&mut self.registry)?;
        let own = self.user.as_ref() == Some(&user);
        let pending = if own { self.pending.remove(&seq) } else { None };
        if let Err(err) = command.apply(self.base.drawing_mut()) {
            log::error!("replica diverged: change #{seq} from {user} does not apply: {err}");
            if let Some(pending) = pending {
                self.withdraw(pending);
            }
            return Err(err.into());
        }
        if let Some(pending) = pending {
            self.confirm(pending);
        }
        self.base.log(command.clone());
        Ok(ReplicaEvent::Changed { command, user, own })
    }

    fn confirm(&mut self, pending: Pending) {
        let current = pending.generation == self.edits;
        match pending.origin {
            Origin::Edit | Origin::Redo => self.own.push(pending.sent),
            Origin::Undo(edit) if current => self.redo.push(edit),
            Origin::Undo(_) => log::debug!("replica: undo settled after a newer edit"),
        }
    }

    /// Undo bookkeeping for a request that will never be confirmed.
    fn withdraw(&mut self, pending: Pending) -> Command {
        match pending.origin {
            Origin::Edit => {}
            Origin::Undo(edit) => self.own.push(edit),
            Origin::Redo if pending.generation == self.edits => {
                self.redo.push(pending.sent.clone())
            }
            Origin::Redo => {}
        }
        pending.sent
    }
}

impl<T: Transport> History for ReplicatedLog<T> {
    type Error = SyncError;

    fn add(&mut self, command: Command) -> Result<(), SyncError> {
        ReplicatedLog::add(self, command).map(drop)
    }

    fn log(&mut self, command: Command) -> Result<(), SyncError> {
        ReplicatedLog::log(self, command).map(drop)
    }

    fn undo(&mut self) -> Result<bool, SyncError> {
        ReplicatedLog::undo(self)
    }

    fn redo(&mut self) -> Result<bool, SyncError> {
        ReplicatedLog::redo(self)
    }

    fn can_undo(&self) -> bool {
        ReplicatedLog::can_undo(self)
    }

    fn can_redo(&self) -> bool {
        ReplicatedLog::can_redo(self)
    }

    fn drawing(&self) -> &Drawing {
        self.base.drawing()
    }

    fn drawing_mut(&mut self) -> &mut Drawing {
        self.base.drawing_mut()
    }
}

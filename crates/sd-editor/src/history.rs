//! Local undo/redo history over a drawing.
//!
//! `Log` is `(commands, index)`: entries before `index` are in effect,
//! entries after it have been undone and can be redone. Recording a new
//! command while a redo branch exists resolves that branch according to the
//! log's `LogUndoPolicy`.

use crate::commands::Command;
use crate::drawing::Drawing;
use crate::error::CommandError;
use crate::observer::{ObserverId, Observers};
use std::fmt;
use std::str::FromStr;

/// What happens to undone entries when a new command is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogUndoPolicy {
    /// Keep the abandoned branch as explicit inverse steps appended to the
    /// end of the history, so nothing is ever lost.
    #[default]
    Gnu,
    /// Drop the abandoned branch.
    Microsoft,
}

impl FromStr for LogUndoPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gnu" => Ok(LogUndoPolicy::Gnu),
            "microsoft" => Ok(LogUndoPolicy::Microsoft),
            other => Err(format!("unknown undo policy `{other}` (expected gnu or microsoft)")),
        }
    }
}

impl fmt::Display for LogUndoPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogUndoPolicy::Gnu => "gnu",
            LogUndoPolicy::Microsoft => "microsoft",
        })
    }
}

/// The operations an editor front end drives, implemented by both the local
/// `Log` and the server-backed `ReplicatedLog`.
pub trait History {
    type Error: std::error::Error;

    /// Perform `command` and record it.
    fn add(&mut self, command: Command) -> Result<(), Self::Error>;
    /// Record `command`, which the caller has already applied.
    fn log(&mut self, command: Command) -> Result<(), Self::Error>;
    /// Returns false when there was nothing to undo.
    fn undo(&mut self) -> Result<bool, Self::Error>;
    /// Returns false when there was nothing to redo.
    fn redo(&mut self) -> Result<bool, Self::Error>;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn drawing(&self) -> &Drawing;
    fn drawing_mut(&mut self) -> &mut Drawing;
}

pub struct Log {
    target: Drawing,
    policy: LogUndoPolicy,
    commands: Vec<Command>,
    index: usize,
    observers: Observers<Log>,
}

impl Log {
    pub fn new(target: Drawing) -> Self {
        Self::with_policy(target, LogUndoPolicy::default())
    }

    pub fn with_policy(target: Drawing, policy: LogUndoPolicy) -> Self {
        Self {
            target,
            policy,
            commands: Vec::new(),
            index: 0,
            observers: Observers::default(),
        }
    }

    pub fn policy(&self) -> LogUndoPolicy {
        self.policy
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of entries, undone ones included.
    pub fn size(&self) -> usize {
        self.commands.len()
    }

    /// Number of entries currently in effect.
    pub fn version(&self) -> usize {
        self.index
    }

    pub fn drawing(&self) -> &Drawing {
        &self.target
    }

    pub fn drawing_mut(&mut self) -> &mut Drawing {
        &mut self.target
    }

    pub fn into_drawing(self) -> Drawing {
        self.target
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.commands.len()
    }

    /// Record `command` as already applied to the drawing.
    pub fn log(&mut self, command: Command) {
        if self.can_redo() {
            match self.policy {
                LogUndoPolicy::Gnu => {
                    let undone = self.commands[self.index..].to_vec();
                    self.commands
                        .extend(undone.into_iter().rev().map(Command::undo_of));
                }
                LogUndoPolicy::Microsoft => self.commands.truncate(self.index),
            }
        }
        self.commands.push(command);
        self.index = self.commands.len();
        log::debug!("log: recorded, size={} index={}", self.size(), self.index);
        self.notify_observers();
    }

    /// Apply `command` to the drawing, then record it. Nothing is recorded
    /// if it fails.
    pub fn add(&mut self, command: Command) -> Result<(), CommandError> {
        command.apply(&mut self.target)?;
        self.log(command);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        if !self.can_undo() {
            return Ok(false);
        }
        self.commands[self.index - 1].undo(&mut self.target)?;
        self.index -= 1;
        log::debug!("log: undo, size={} index={}", self.size(), self.index);
        self.notify_observers();
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        if !self.can_redo() {
            return Ok(false);
        }
        self.commands[self.index].apply(&mut self.target)?;
        self.index += 1;
        log::debug!("log: redo, size={} index={}", self.size(), self.index);
        self.notify_observers();
        Ok(true)
    }

    /// Forget the history. The drawing is left as it is.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.index = 0;
        log::debug!("log: cleared");
        self.notify_observers();
    }

    pub fn add_observer(&mut self, observer: impl FnMut(&Log) + 'static) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    fn notify_observers(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        observers.notify(self);
        self.observers = observers;
    }
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log")
            .field("policy", &self.policy)
            .field("size", &self.commands.len())
            .field("index", &self.index)
            .finish()
    }
}

impl History for Log {
    type Error = CommandError;

    fn add(&mut self, command: Command) -> Result<(), CommandError> {
        Log::add(self, command)
    }

    fn log(&mut self, command: Command) -> Result<(), CommandError> {
        Log::log(self, command);
        Ok(())
    }

    fn undo(&mut self) -> Result<bool, CommandError> {
        Log::undo(self)
    }

    fn redo(&mut self) -> Result<bool, CommandError> {
        Log::redo(self)
    }

    fn can_undo(&self) -> bool {
        Log::can_undo(self)
    }

    fn can_redo(&self) -> bool {
        Log::can_redo(self)
    }

    fn drawing(&self) -> &Drawing {
        &self.target
    }

    fn drawing_mut(&mut self) -> &mut Drawing {
        &mut self.target
    }
}

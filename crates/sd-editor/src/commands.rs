//! Invertible drawing commands.
//!
//! A `Command` is a cheap shared handle: cloning it clones the pointer, and
//! `Command::ptr_eq` compares instances. `undo_command` collapses double
//! negation to the *same* instance, and `sequence_command` splices nested
//! compounds without copying their children.
//!
//! Every `apply`/`undo` checks its precondition before touching the drawing,
//! and compounds roll back what they already did on failure. A command that
//! errors leaves the drawing as it found it.

use crate::drawing::Drawing;
use crate::error::CommandError;
use sd_core::{Point, Shape, Vector};
use std::rc::Rc;

#[derive(Debug)]
pub enum CommandKind {
    AddShape {
        shape: Shape,
    },
    /// Move `shape` by `amount`, valid only while it sits at `old_center`.
    MoveShape {
        shape: Shape,
        old_center: Point,
        amount: Vector,
    },
    /// The inverse of `inner`.
    Undo {
        inner: Command,
    },
    /// All-or-nothing sequence.
    Compound {
        commands: Vec<Command>,
    },
}

#[derive(Debug, Clone)]
pub struct Command(Rc<CommandKind>);

impl Command {
    fn from_kind(kind: CommandKind) -> Self {
        Command(Rc::new(kind))
    }

    pub fn add_shape(shape: Shape) -> Self {
        Self::from_kind(CommandKind::AddShape { shape })
    }

    pub fn move_shape(shape: Shape, old_center: Point, amount: Vector) -> Self {
        Self::from_kind(CommandKind::MoveShape {
            shape,
            old_center,
            amount,
        })
    }

    /// Wrap `inner` without collapsing. Prefer `undo_command`.
    pub fn undo_of(inner: Command) -> Self {
        Self::from_kind(CommandKind::Undo { inner })
    }

    /// Build a compound as given, without flattening. Prefer `sequence_command`.
    pub fn compound(commands: Vec<Command>) -> Self {
        Self::from_kind(CommandKind::Compound { commands })
    }

    pub fn kind(&self) -> &CommandKind {
        &self.0
    }

    pub fn ptr_eq(&self, other: &Command) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The wrapped command, if this is an `Undo`.
    pub fn inverse_of(&self) -> Option<&Command> {
        match self.kind() {
            CommandKind::Undo { inner } => Some(inner),
            _ => None,
        }
    }

    /// Sub-commands, if this is a `Compound`.
    pub fn children(&self) -> Option<&[Command]> {
        match self.kind() {
            CommandKind::Compound { commands } => Some(commands),
            _ => None,
        }
    }

    pub fn apply(&self, drawing: &mut Drawing) -> Result<(), CommandError> {
        match self.kind() {
            CommandKind::AddShape { shape } => {
                if drawing.contains(shape) {
                    return Err(CommandError::AlreadyPresent(shape.id()));
                }
                drawing.add(shape.clone());
                Ok(())
            }
            CommandKind::MoveShape {
                shape,
                old_center,
                amount,
            } => {
                check_center(shape, *old_center)?;
                shape.move_by(amount);
                drawing.notify_observers();
                Ok(())
            }
            CommandKind::Undo { inner } => inner.undo(drawing),
            CommandKind::Compound { commands } => {
                for (k, command) in commands.iter().enumerate() {
                    if let Err(err) = command.apply(drawing) {
                        for done in commands[..k].iter().rev() {
                            if let Err(rollback) = done.undo(drawing) {
                                log::error!("compound rollback failed: {rollback}");
                            }
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
        }
    }

    pub fn undo(&self, drawing: &mut Drawing) -> Result<(), CommandError> {
        match self.kind() {
            CommandKind::AddShape { shape } => {
                if !drawing.remove(shape) {
                    return Err(CommandError::NotPresent(shape.id()));
                }
                Ok(())
            }
            CommandKind::MoveShape {
                shape,
                old_center,
                amount,
            } => {
                check_center(shape, amount.move_point(*old_center))?;
                shape.move_back(amount, *old_center);
                drawing.notify_observers();
                Ok(())
            }
            CommandKind::Undo { inner } => inner.apply(drawing),
            CommandKind::Compound { commands } => {
                for (k, command) in commands.iter().enumerate().rev() {
                    if let Err(err) = command.undo(drawing) {
                        for done in &commands[k + 1..] {
                            if let Err(rollback) = done.apply(drawing) {
                                log::error!("compound rollback failed: {rollback}");
                            }
                        }
                        return Err(err);
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_center(shape: &Shape, expected: Point) -> Result<(), CommandError> {
    let actual = shape.center();
    if actual != expected {
        return Err(CommandError::CenterMismatch {
            id: shape.id(),
            expected,
            actual,
        });
    }
    Ok(())
}

// ─── Constructors ───────────────────────────────────────────────────────

/// The inverse of `command`. Inverting an `Undo` returns the very command it
/// wraps, so `undo_command(&undo_command(&c))` is `c` itself.
pub fn undo_command(command: &Command) -> Command {
    match command.inverse_of() {
        Some(inner) => inner.clone(),
        None => Command::undo_of(command.clone()),
    }
}

/// Join `commands` into one, splicing in the children of any compound
/// member (one level). A single result is returned bare.
pub fn sequence_command(commands: impl IntoIterator<Item = Command>) -> Command {
    let mut flat = Vec::new();
    for command in commands {
        match command.children() {
            Some(children) => flat.extend(children.iter().cloned()),
            None => flat.push(command),
        }
    }
    if flat.len() == 1 {
        if let Some(only) = flat.pop() {
            return only;
        }
    }
    Command::compound(flat)
}

/// Move `shape` from where it is now.
pub fn move_shape_command(shape: Shape, amount: Vector) -> Command {
    let old_center = shape.center();
    Command::move_shape(shape, old_center, amount)
}

pub fn remove_shape_command(shape: Shape) -> Command {
    Command::undo_of(Command::add_shape(shape))
}

/// A command that does nothing.
pub fn null_command() -> Command {
    Command::compound(Vec::new())
}

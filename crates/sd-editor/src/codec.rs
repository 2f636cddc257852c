//! JSON wire form of commands.
//!
//! ```json
//! {"kind": "move_shape", "shape": {…}, "oldCenter": {"x": 0, "y": 0}, "amount": {"dx": 1, "dy": 0}}
//! ```
//!
//! Shapes inside a command are resolved through the session's
//! `ShapeRegistry`, so a decoded command refers to the live instances.

use crate::commands::{Command, CommandKind, sequence_command, undo_command};
use sd_core::{DecodeError, Point, ShapeRegistry, Vector, WireShape};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireCommand {
    Compound {
        commands: Vec<WireCommand>,
    },
    Undo {
        command: Box<WireCommand>,
    },
    AddShape {
        shape: WireShape,
    },
    MoveShape {
        shape: WireShape,
        #[serde(rename = "oldCenter")]
        old_center: Point,
        amount: Vector,
    },
}

impl WireCommand {
    /// Resolve into a live command. Compounds are rebuilt with
    /// `sequence_command` and undos with `undo_command`.
    pub fn decode(&self, registry: &mut ShapeRegistry) -> Result<Command, DecodeError> {
        Ok(match self {
            WireCommand::Compound { commands } => sequence_command(
                commands
                    .iter()
                    .map(|c| c.decode(registry))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            WireCommand::Undo { command } => undo_command(&command.decode(registry)?),
            WireCommand::AddShape { shape } => Command::add_shape(registry.decode(shape)?),
            WireCommand::MoveShape {
                shape,
                old_center,
                amount,
            } => Command::move_shape(registry.decode(shape)?, *old_center, *amount),
        })
    }

    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<&Command> for WireCommand {
    fn from(command: &Command) -> Self {
        match command.kind() {
            CommandKind::AddShape { shape } => WireCommand::AddShape {
                shape: shape.to_wire(),
            },
            CommandKind::MoveShape {
                shape,
                old_center,
                amount,
            } => WireCommand::MoveShape {
                shape: shape.to_wire(),
                old_center: *old_center,
                amount: *amount,
            },
            CommandKind::Undo { inner } => WireCommand::Undo {
                command: Box::new(inner.into()),
            },
            CommandKind::Compound { commands } => WireCommand::Compound {
                commands: commands.iter().map(WireCommand::from).collect(),
            },
        }
    }
}

impl Command {
    pub fn to_wire(&self) -> WireCommand {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::move_shape_command;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn move_shape_uses_camel_case_old_center() {
        let mut reg = ShapeRegistry::new();
        let s = reg
            .create(
                Some(sd_core::ShapeId::intern("codec-c")),
                Point::new(1.0, 2.0),
                sd_core::Geometry::Circle { radius: 3.0 },
            )
            .unwrap();
        let value = serde_json::to_value(move_shape_command(s, Vector::new(4.0, 0.0)).to_wire())
            .unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "move_shape",
                "shape": {"type": "circle", "id": "codec-c", "center": {"x": 1.0, "y": 2.0}, "radius": 3.0},
                "oldCenter": {"x": 1.0, "y": 2.0},
                "amount": {"dx": 4.0, "dy": 0.0}
            })
        );
    }

    #[test]
    fn decoded_double_undo_collapses() {
        let mut reg = ShapeRegistry::new();
        let wire = WireCommand::from_json(
            r#"{"kind": "undo", "command": {"kind": "undo", "command":
                {"kind": "add_shape", "shape": {"type": "circle", "id": "codec-u", "center": {"x": 0, "y": 0}, "radius": 1}}}}"#,
        )
        .unwrap();
        let cmd = wire.decode(&mut reg).unwrap();
        assert!(matches!(cmd.kind(), CommandKind::AddShape { .. }));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            WireCommand::from_json(r#"{"kind": "scale_shape"}"#),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn shapes_resolve_to_live_instances() {
        let mut reg = ShapeRegistry::new();
        let s = reg.square(Point::ORIGIN, 2.0).unwrap();
        let wire = crate::commands::Command::add_shape(s.clone()).to_wire();
        let back = wire.decode(&mut reg).unwrap();
        match back.kind() {
            CommandKind::AddShape { shape } => assert!(shape.ptr_eq(&s)),
            other => panic!("unexpected {other:?}"),
        }
    }
}

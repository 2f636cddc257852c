//! Shared Draw core: geometry, identity-preserving shapes, and their wire form.

pub mod error;
pub mod geometry;
pub mod id;
pub mod registry;
pub mod render;
pub mod shape;
pub mod wire;

pub use error::{DecodeError, ShapeError};
pub use geometry::{Point, Vector};
pub use id::ShapeId;
pub use registry::{Factories, ShapeFactory, ShapeRegistry};
pub use render::{StrokeStyle, Surface, SvgSurface};
pub use shape::{CLOSE, ElementCursor, Geometry, Shape, ShapeKind};
pub use wire::WireShape;

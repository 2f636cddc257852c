//! Session-scoped shape store and wire decoding.
//!
//! `ShapeRegistry` guarantees at most one live `Shape` per id. Every shape
//! built by a session is registered here, and decoding a wire shape whose id
//! is already known returns that very instance (the payload's other fields
//! are ignored: a cache hit, not a merge). Fresh ids are decoded through the
//! factory registered for the payload's `type` tag.
//!
//! The store is never purged; entries live as long as the session.

use crate::error::{DecodeError, ShapeError};
use crate::geometry::Point;
use crate::id::ShapeId;
use crate::shape::{Geometry, Shape, ShapeKind};
use crate::wire::WireShape;
use serde_json::Value;
use std::collections::HashMap;

/// Builds the variant geometry for a wire shape. Nested shapes must be
/// decoded through the registry so they are deduplicated too.
pub type ShapeFactory = fn(&WireShape, &mut ShapeRegistry) -> Result<Geometry, DecodeError>;

// ─── Factories ───────────────────────────────────────────────────────────

/// Type tag → factory table.
#[derive(Clone, Default)]
pub struct Factories {
    table: HashMap<String, ShapeFactory>,
}

impl Factories {
    /// An empty table; every decode fails with `UnknownType`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factories for `circle`, `rectangle` and `group`.
    pub fn standard() -> Self {
        let mut f = Self::new();
        f.register(ShapeKind::Circle.tag(), decode_circle);
        f.register(ShapeKind::Rectangle.tag(), decode_rectangle);
        f.register(ShapeKind::Group.tag(), decode_group);
        f
    }

    /// Register a factory, returning the one it replaces.
    pub fn register(&mut self, tag: &str, factory: ShapeFactory) -> Option<ShapeFactory> {
        self.table.insert(tag.to_string(), factory)
    }

    pub fn get(&self, tag: &str) -> Option<ShapeFactory> {
        self.table.get(tag).copied()
    }
}

fn decode_circle(w: &WireShape, _: &mut ShapeRegistry) -> Result<Geometry, DecodeError> {
    Ok(Geometry::Circle {
        radius: w.number("radius")?,
    })
}

fn decode_rectangle(w: &WireShape, _: &mut ShapeRegistry) -> Result<Geometry, DecodeError> {
    Ok(Geometry::Rectangle {
        width: w.number("width")?,
        height: w.number("height")?,
    })
}

fn decode_group(w: &WireShape, reg: &mut ShapeRegistry) -> Result<Geometry, DecodeError> {
    let elements = w
        .shapes("elements")?
        .iter()
        .map(|e| reg.decode(e))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Geometry::Group { elements })
}

// ─── Registry ─────────────────────────────────────────────────────────────

pub struct ShapeRegistry {
    shapes: HashMap<ShapeId, Shape>,
    factories: Factories,
}

impl ShapeRegistry {
    /// A registry with the standard factories.
    pub fn new() -> Self {
        Self::with_factories(Factories::standard())
    }

    pub fn with_factories(factories: Factories) -> Self {
        Self {
            shapes: HashMap::new(),
            factories,
        }
    }

    pub fn factories_mut(&mut self) -> &mut Factories {
        &mut self.factories
    }

    pub fn get(&self, id: ShapeId) -> Option<Shape> {
        self.shapes.get(&id).cloned()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Build and register a shape. `None` mints a fresh id; an id that is
    /// already registered is a `DuplicateId` error.
    pub fn create(
        &mut self,
        id: Option<ShapeId>,
        center: Point,
        geometry: Geometry,
    ) -> Result<Shape, ShapeError> {
        let id = id.unwrap_or_else(ShapeId::generate);
        if self.shapes.contains_key(&id) {
            return Err(ShapeError::DuplicateId(id));
        }
        geometry.validate()?;
        let shape = Shape::new(id, center, geometry);
        self.shapes.insert(id, shape.clone());
        log::trace!("registered {} {id:?}", shape.kind().tag());
        Ok(shape)
    }

    pub fn circle(&mut self, center: Point, radius: f64) -> Result<Shape, ShapeError> {
        self.create(None, center, Geometry::Circle { radius })
    }

    pub fn rectangle(&mut self, center: Point, width: f64, height: f64) -> Result<Shape, ShapeError> {
        self.create(None, center, Geometry::Rectangle { width, height })
    }

    pub fn square(&mut self, center: Point, size: f64) -> Result<Shape, ShapeError> {
        self.rectangle(center, size, size)
    }

    /// A rectangle spanning two opposite corners. Width and height are
    /// signed: `corner2 - corner1`.
    pub fn rectangle_from_corners(
        &mut self,
        corner1: Point,
        corner2: Point,
    ) -> Result<Shape, ShapeError> {
        let center = Point::new((corner1.x + corner2.x) / 2.0, (corner1.y + corner2.y) / 2.0);
        self.rectangle(center, corner2.x - corner1.x, corner2.y - corner1.y)
    }

    /// A group centered on the centroid of `elements`.
    pub fn group(&mut self, elements: Vec<Shape>) -> Result<Shape, ShapeError> {
        let center = Point::centroid(elements.iter().map(Shape::center));
        self.create(None, center, Geometry::Group { elements })
    }

    /// Resolve a wire shape to its live instance, creating it on first sight.
    pub fn decode(&mut self, wire: &WireShape) -> Result<Shape, DecodeError> {
        if let Some(existing) = self.shapes.get(&wire.id) {
            return Ok(existing.clone());
        }
        let factory = self
            .factories
            .get(&wire.kind)
            .ok_or_else(|| DecodeError::UnknownType(wire.kind.clone()))?;
        let geometry = factory(wire, self)?;
        Ok(self.create(Some(wire.id), wire.center, geometry)?)
    }

    /// `decode` from an untyped JSON value.
    pub fn decode_value(&mut self, value: Value) -> Result<Shape, DecodeError> {
        let wire = WireShape::from_value(value)?;
        self.decode(&wire)
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

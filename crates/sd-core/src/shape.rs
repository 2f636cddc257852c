//! Drawable shapes with stable identity.
//!
//! A `Shape` is a shared handle: cloning it yields another reference to the
//! same entity, and `ptr_eq` is the identity test. The id never changes; the
//! center and size do, through `move_by` and `scale`.
//!
//! Groups own an ordered list of element handles. A group's center is the
//! centroid of its elements at construction and is never recomputed; moving
//! or scaling a group pushes the transform down to every element explicitly.

use crate::error::ShapeError;
use crate::geometry::{Point, Vector};
use crate::id::ShapeId;
use crate::render::{StrokeStyle, Surface};
use crate::wire::WireShape;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Hit-test tolerance, in drawing units.
pub const CLOSE: f64 = 3.0;

// ─── Kinds ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Group,
}

impl ShapeKind {
    /// The wire `type` tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Group => "group",
        }
    }
}

/// Variant-specific state of a shape.
#[derive(Debug, Clone)]
pub enum Geometry {
    Circle { radius: f64 },
    Rectangle { width: f64, height: f64 },
    Group { elements: Vec<Shape> },
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Rectangle { .. } => ShapeKind::Rectangle,
            Geometry::Group { .. } => ShapeKind::Group,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ShapeError> {
        match self {
            Geometry::Circle { radius } if *radius == 0.0 => Err(ShapeError::ZeroRadius),
            _ => Ok(()),
        }
    }
}

// ─── Shape handle ─────────────────────────────────────────────────────────

struct ShapeData {
    id: ShapeId,
    center: Point,
    geometry: Geometry,
}

impl ShapeData {
    fn elements(&self) -> Vec<Shape> {
        match &self.geometry {
            Geometry::Group { elements } => elements.clone(),
            _ => Vec::new(),
        }
    }
}

/// A shared reference to a shape entity.
#[derive(Clone)]
pub struct Shape(Rc<RefCell<ShapeData>>);

impl Shape {
    /// Shapes are only built through a `ShapeRegistry`, which enforces
    /// unique ids and validates the geometry.
    pub(crate) fn new(id: ShapeId, center: Point, geometry: Geometry) -> Self {
        Shape(Rc::new(RefCell::new(ShapeData {
            id,
            center,
            geometry,
        })))
    }

    pub fn id(&self) -> ShapeId {
        self.0.borrow().id
    }

    pub fn center(&self) -> Point {
        self.0.borrow().center
    }

    pub fn kind(&self) -> ShapeKind {
        self.0.borrow().geometry.kind()
    }

    pub fn radius(&self) -> Option<f64> {
        match self.0.borrow().geometry {
            Geometry::Circle { radius } => Some(radius),
            _ => None,
        }
    }

    /// `(width, height)` of a rectangle.
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        match self.0.borrow().geometry {
            Geometry::Rectangle { width, height } => Some((width, height)),
            _ => None,
        }
    }

    /// Snapshot of a group's elements, in order.
    pub fn elements(&self) -> Option<Vec<Shape>> {
        match &self.0.borrow().geometry {
            Geometry::Group { elements } => Some(elements.clone()),
            _ => None,
        }
    }

    pub fn element_count(&self) -> Option<usize> {
        match &self.0.borrow().geometry {
            Geometry::Group { elements } => Some(elements.len()),
            _ => None,
        }
    }

    /// Whether both handles refer to the same entity.
    pub fn ptr_eq(&self, other: &Shape) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Translate the shape (and every element of a group) by `v`.
    pub fn move_by(&self, v: &Vector) {
        let elements = {
            let mut data = self.0.borrow_mut();
            data.center = v.move_point(data.center);
            data.elements()
        };
        for element in elements {
            element.move_by(v);
        }
    }

    /// Reverse a `move_by(amount)` that started from `origin`.
    ///
    /// The shape's own center is assigned `origin` exactly rather than
    /// recomputed, so `(origin + amount) - amount` rounding never shows up.
    /// Group elements are translated back by `-amount`.
    pub fn move_back(&self, amount: &Vector, origin: Point) {
        let elements = {
            let mut data = self.0.borrow_mut();
            data.center = origin;
            data.elements()
        };
        let back = -*amount;
        for element in elements {
            element.move_by(&back);
        }
    }

    /// Move the shape so its center lands on `p`.
    pub fn set_center(&self, p: Point) {
        let v = Vector::from_points(self.center(), p);
        self.move_by(&v);
    }

    /// Scale the shape around its own center.
    ///
    /// Group elements are scaled in place and then pushed away from (or
    /// toward) the group center so their offsets scale by the same amount.
    pub fn scale(&self, amount: f64) -> Result<(), ShapeError> {
        if amount == 0.0 {
            return Err(ShapeError::ZeroScale);
        }
        let (center, elements) = {
            let mut data = self.0.borrow_mut();
            match &mut data.geometry {
                Geometry::Circle { radius } => *radius *= amount,
                Geometry::Rectangle { width, height } => {
                    *width *= amount;
                    *height *= amount;
                }
                Geometry::Group { .. } => {}
            }
            (data.center, data.elements())
        };
        for element in elements {
            let offset = Vector::from_points(center, element.center());
            element.scale(amount)?;
            element.move_by(&offset.scale(amount - 1.0));
        }
        Ok(())
    }

    /// Whether `p` lies on the outline, within `CLOSE`.
    pub fn is_on(&self, p: Point) -> bool {
        let data = self.0.borrow();
        match &data.geometry {
            Geometry::Circle { radius } => {
                let dist = Vector::from_points(data.center, p).magnitude();
                (dist - radius.abs()).abs() < CLOSE
            }
            Geometry::Rectangle { width, height } => {
                let xdiff = (p.x - data.center.x).abs();
                let ydiff = (p.y - data.center.y).abs();
                let w2 = width.abs() / 2.0;
                let h2 = height.abs() / 2.0;
                let in_range = xdiff <= w2 && ydiff <= h2;
                let on_edges = (xdiff - w2).abs() < CLOSE || (ydiff - h2).abs() < CLOSE;
                in_range && on_edges
            }
            Geometry::Group { elements } => elements.iter().any(|e| e.is_on(p)),
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface, selected: bool) {
        let style = StrokeStyle::from_selected(selected);
        let data = self.0.borrow();
        match &data.geometry {
            Geometry::Circle { radius } => surface.stroke_circle(data.center, *radius, style),
            Geometry::Rectangle { width, height } => {
                surface.stroke_rect(data.center, *width, *height, style)
            }
            Geometry::Group { elements } => {
                for element in elements {
                    element.draw(surface, selected);
                }
            }
        }
    }

    /// Encode the current state as `{type, id, center, ...variant fields}`.
    pub fn to_wire(&self) -> WireShape {
        let data = self.0.borrow();
        let mut fields = Map::new();
        match &data.geometry {
            Geometry::Circle { radius } => {
                fields.insert("radius".to_string(), Value::from(*radius));
            }
            Geometry::Rectangle { width, height } => {
                fields.insert("width".to_string(), Value::from(*width));
                fields.insert("height".to_string(), Value::from(*height));
            }
            Geometry::Group { elements } => {
                let encoded = elements.iter().map(|e| e.to_wire().into_value()).collect();
                fields.insert("elements".to_string(), Value::Array(encoded));
            }
        }
        WireShape {
            kind: data.geometry.kind().tag().to_string(),
            id: data.id,
            center: data.center,
            fields,
        }
    }

    /// A cursor over a group's elements that can remove as it goes.
    pub fn cursor(&self) -> Result<ElementCursor, ShapeError> {
        match self.kind() {
            ShapeKind::Group => Ok(ElementCursor {
                group: self.clone(),
                next: 0,
                current: None,
            }),
            _ => Err(ShapeError::NotAGroup(self.id())),
        }
    }

    /// Drop every group element for which `keep` returns false.
    /// Returns the resulting element count.
    pub fn retain_elements(&self, mut keep: impl FnMut(&Shape) -> bool) -> Result<usize, ShapeError> {
        let mut cursor = self.cursor()?;
        while let Some(element) = cursor.next() {
            if !keep(&element) {
                cursor.remove_current();
            }
        }
        Ok(cursor.finish())
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Shape")
            .field("id", &data.id)
            .field("center", &data.center)
            .field("geometry", &data.geometry)
            .finish()
    }
}

// ─── Removable iteration ─────────────────────────────────────────────────

/// Walks a group's elements in order. `remove_current` drops the element
/// most recently returned; iteration continues with the element after it.
///
/// Use with `while let Some(e) = cursor.next()` so removal can be issued
/// between steps.
pub struct ElementCursor {
    group: Shape,
    next: usize,
    current: Option<usize>,
}

impl ElementCursor {
    fn with_elements<R>(&self, f: impl FnOnce(&mut Vec<Shape>) -> R) -> R {
        let mut data = self.group.0.borrow_mut();
        match &mut data.geometry {
            Geometry::Group { elements } => f(elements),
            _ => f(&mut Vec::new()),
        }
    }

    /// Remove the element last yielded by `next`. Returns it, or `None` if
    /// there is no current element (nothing yielded yet, or already removed).
    pub fn remove_current(&mut self) -> Option<Shape> {
        let index = self.current.take()?;
        let removed = self.with_elements(|elements| {
            (index < elements.len()).then(|| elements.remove(index))
        })?;
        self.next = index;
        Some(removed)
    }

    /// Current number of elements in the group.
    pub fn len(&self) -> usize {
        self.with_elements(|elements| elements.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End the walk, reporting the resulting element count.
    pub fn finish(self) -> usize {
        self.len()
    }
}

impl Iterator for ElementCursor {
    type Item = Shape;

    fn next(&mut self) -> Option<Shape> {
        let index = self.next;
        let element = self.with_elements(|elements| elements.get(index).cloned());
        match element {
            Some(shape) => {
                self.current = Some(index);
                self.next = index + 1;
                Some(shape)
            }
            None => {
                self.current = None;
                None
            }
        }
    }
}

//! The observed collection of shapes a log edits.
//!
//! Membership is by instance (`Shape::ptr_eq`), never by id alone: the
//! session registry guarantees a single instance per id, so the two agree.
//! Observers run after `add`/`remove` and whenever a command moves a shape
//! in place (see `Drawing::notify_observers`).

use crate::observer::{ObserverId, Observers};
use sd_core::{Point, Shape, ShapeId, Surface};

#[derive(Default)]
pub struct Drawing {
    shapes: Vec<Shape>,
    observers: Observers<Drawing>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `shape` on top. Adding an instance that is already present is
    /// a no-op; commands check membership before calling this.
    pub fn add(&mut self, shape: Shape) {
        if self.contains(&shape) {
            return;
        }
        self.shapes.push(shape);
        self.notify_observers();
    }

    /// Returns whether `shape` was present.
    pub fn remove(&mut self, shape: &Shape) -> bool {
        let Some(pos) = self.shapes.iter().position(|s| s.ptr_eq(shape)) else {
            return false;
        };
        self.shapes.remove(pos);
        self.notify_observers();
        true
    }

    pub fn contains(&self, shape: &Shape) -> bool {
        self.shapes.iter().any(|s| s.ptr_eq(shape))
    }

    pub fn find(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    /// Shapes bottom to top, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// The topmost shape whose outline passes through `p`.
    pub fn shape_at(&self, p: Point) -> Option<&Shape> {
        self.shapes.iter().rev().find(|s| s.is_on(p))
    }

    /// Stroke every shape, highlighting those in `selection`.
    pub fn draw(&self, surface: &mut dyn Surface, selection: &[Shape]) {
        for shape in &self.shapes {
            let selected = selection.iter().any(|s| s.ptr_eq(shape));
            shape.draw(surface, selected);
        }
    }

    pub fn add_observer(&mut self, observer: impl FnMut(&Drawing) + 'static) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Tell observers the drawing changed. Shapes mutate in place, so moves
    /// are reported by whoever performed them.
    pub fn notify_observers(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        observers.notify(self);
        self.observers = observers;
    }
}

impl std::fmt::Debug for Drawing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawing")
            .field("shapes", &self.shapes)
            .field("observers", &self.observers.len())
            .finish()
    }
}

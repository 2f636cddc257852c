//! Plane geometry: points and displacement vectors.
//!
//! `Vector` has two interchangeable representations. Cartesian vectors store
//! `(dx, dy)`; polar vectors store `(magnitude, angle)` and derive the
//! components on demand. All shared operations agree across representations
//! within floating-point tolerance. On the wire a vector is always `{dx, dy}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg};

// ─── Point ──────────────────────────────────────────────────────────────

/// An immutable position on the drawing plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Arithmetic mean of the given points, or the origin if there are none.
    pub fn centroid(points: impl IntoIterator<Item = Point>) -> Point {
        let mut n = 0usize;
        let (mut sx, mut sy) = (0.0, 0.0);
        for p in points {
            sx += p.x;
            sy += p.y;
            n += 1;
        }
        if n == 0 {
            return Point::ORIGIN;
        }
        Point::new(sx / n as f64, sy / n as f64)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

// ─── Vector ─────────────────────────────────────────────────────────────

/// A displacement on the drawing plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireVector", into = "WireVector")]
pub enum Vector {
    Cartesian { dx: f64, dy: f64 },
    Polar { magnitude: f64, angle: f64 },
}

#[derive(Serialize, Deserialize)]
struct WireVector {
    dx: f64,
    dy: f64,
}

impl From<WireVector> for Vector {
    fn from(w: WireVector) -> Self {
        Vector::new(w.dx, w.dy)
    }
}

impl From<Vector> for WireVector {
    fn from(v: Vector) -> Self {
        WireVector {
            dx: v.dx(),
            dy: v.dy(),
        }
    }
}

impl Vector {
    pub const ZERO: Vector = Vector::Cartesian { dx: 0.0, dy: 0.0 };

    /// A Cartesian vector.
    pub const fn new(dx: f64, dy: f64) -> Self {
        Vector::Cartesian { dx, dy }
    }

    /// A polar vector; `angle` is in radians, counter-clockwise from +x.
    pub const fn polar(magnitude: f64, angle: f64) -> Self {
        Vector::Polar { magnitude, angle }
    }

    /// The vector that carries `from` onto `to`.
    pub fn from_points(from: Point, to: Point) -> Self {
        Vector::new(to.x - from.x, to.y - from.y)
    }

    pub fn dx(&self) -> f64 {
        match *self {
            Vector::Cartesian { dx, .. } => dx,
            Vector::Polar { magnitude, angle } => angle.cos() * magnitude,
        }
    }

    pub fn dy(&self) -> f64 {
        match *self {
            Vector::Cartesian { dy, .. } => dy,
            Vector::Polar { magnitude, angle } => angle.sin() * magnitude,
        }
    }

    pub fn magnitude(&self) -> f64 {
        match *self {
            Vector::Cartesian { dx, dy } => dx.hypot(dy),
            Vector::Polar { magnitude, .. } => magnitude,
        }
    }

    pub fn angle(&self) -> f64 {
        match *self {
            Vector::Cartesian { dx, dy } => dy.atan2(dx),
            Vector::Polar { angle, .. } => angle,
        }
    }

    /// Scale by `amount`, keeping the representation.
    pub fn scale(&self, amount: f64) -> Vector {
        match *self {
            Vector::Cartesian { dx, dy } => Vector::new(dx * amount, dy * amount),
            Vector::Polar { magnitude, angle } => Vector::polar(magnitude * amount, angle),
        }
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.dx() * other.dx() + self.dy() * other.dy()
    }

    /// Translate `p` by this vector.
    pub fn move_point(&self, p: Point) -> Point {
        Point::new(p.x + self.dx(), p.y + self.dy())
    }

    pub fn to_cartesian(&self) -> Vector {
        Vector::new(self.dx(), self.dy())
    }

    /// Component-wise comparison within `tolerance`, across representations.
    pub fn approx_eq(&self, other: &Vector, tolerance: f64) -> bool {
        (self.dx() - other.dx()).abs() <= tolerance && (self.dy() - other.dy()).abs() <= tolerance
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::new(self.dx() + other.dx(), self.dy() + other.dy())
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self.scale(-1.0)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{}>", self.dx(), self.dy())
    }
}

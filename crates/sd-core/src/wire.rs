//! JSON wire form of shapes.
//!
//! ```json
//! {"type": "circle", "id": "…", "center": {"x": 0, "y": 0}, "radius": 5}
//! ```
//!
//! The common header (`type`, `id`, `center`) is typed; variant fields are
//! kept as a raw JSON map and interpreted by the factory registered for
//! `type` (see `registry`). Accessors here are strict: a missing or
//! mistyped field is an error, never coerced.

use crate::error::DecodeError;
use crate::geometry::Point;
use crate::id::ShapeId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireShape {
    /// Factory key.
    #[serde(rename = "type")]
    pub kind: String,
    pub id: ShapeId,
    pub center: Point,
    /// Variant fields (`radius`, `width`/`height`, `elements`, …).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl WireShape {
    /// Parse a wire shape from an untyped JSON value.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as a JSON object.
    pub fn into_value(self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String(self.kind));
        obj.insert("id".to_string(), Value::String(self.id.as_str().to_string()));
        let mut center = Map::new();
        center.insert("x".to_string(), Value::from(self.center.x));
        center.insert("y".to_string(), Value::from(self.center.y));
        obj.insert("center".to_string(), Value::Object(center));
        obj.extend(self.fields);
        Value::Object(obj)
    }

    fn field(&self, field: &'static str) -> Result<&Value, DecodeError> {
        self.fields.get(field).ok_or_else(|| DecodeError::MissingField {
            kind: self.kind.clone(),
            field,
        })
    }

    /// A required numeric variant field.
    pub fn number(&self, field: &'static str) -> Result<f64, DecodeError> {
        self.field(field)?
            .as_f64()
            .ok_or_else(|| DecodeError::InvalidField {
                kind: self.kind.clone(),
                field,
                expected: "a number",
            })
    }

    /// A required array-of-shapes variant field.
    pub fn shapes(&self, field: &'static str) -> Result<Vec<WireShape>, DecodeError> {
        let value = self.field(field)?;
        if !value.is_array() {
            return Err(DecodeError::InvalidField {
                kind: self.kind.clone(),
                field,
                expected: "an array of shapes",
            });
        }
        Ok(serde_json::from_value(value.clone())?)
    }
}

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// Every shape id string seen by this process. `ShapeRegistry` maps ids to
/// shape instances; this table only maps strings to keys.
static SHAPE_IDS: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Names a shape across replicas. On the wire it is the plain id string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ShapeId(Spur);

impl ShapeId {
    pub fn intern(s: &str) -> Self {
        ShapeId(SHAPE_IDS.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        SHAPE_IDS.resolve(&self.0)
    }

    /// A v4 UUID, so ids minted by different users never collide.
    pub fn generate() -> Self {
        Self::intern(&Uuid::new_v4().to_string())
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl From<String> for ShapeId {
    fn from(s: String) -> Self {
        Self::intern(&s)
    }
}

impl From<ShapeId> for String {
    fn from(id: ShapeId) -> Self {
        id.as_str().to_owned()
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShapeId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

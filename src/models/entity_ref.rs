use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a host-owned entity being tagged.
///
/// The pair `(entity_type, entity_id)` is the discriminator key for the
/// polymorphic association table: the core never interprets it beyond
/// equality, and never mutates the entity it points at. The host
/// application owns the mapping between its objects and these pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    entity_type: String,
    entity_id: i64,
}

impl EntityRef {
    /// Creates a new entity reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use entag::EntityRef;
    ///
    /// let entity = EntityRef::new("article", 7);
    /// assert_eq!(entity.entity_type(), "article");
    /// assert_eq!(entity.entity_id(), 7);
    /// ```
    pub fn new(entity_type: impl Into<String>, entity_id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }

    /// Returns the host-defined type discriminator.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the host-defined object ID.
    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.entity_id)
    }
}

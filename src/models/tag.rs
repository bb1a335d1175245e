use serde::{Deserialize, Serialize};
use std::fmt;

use super::TagId;
use crate::normalizer;

/// A canonical, uniquely-named label in the shared tag vocabulary.
///
/// The `name` is the case-insensitive canonical form; the `slug` is always
/// derived from the name via [`normalizer::slugify`] and recomputed whenever
/// the name changes, so the two can never diverge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
    slug: String,
}

impl Tag {
    /// Creates a new tag, deriving the slug from the name.
    ///
    /// # Examples
    ///
    /// ```
    /// use entag::{Tag, TagId};
    ///
    /// let tag = Tag::new(TagId::new(1), "machine learning");
    /// assert_eq!(tag.name(), "machine learning");
    /// assert_eq!(tag.slug(), "machine_learning");
    /// ```
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = normalizer::slugify(&name);
        Self { id, name, slug }
    }

    /// Reconstructs a tag from stored columns without re-deriving the slug.
    ///
    /// Used by the stores when reading rows back; the slug column is kept
    /// consistent at write time.
    pub(crate) fn from_row(id: TagId, name: String, slug: String) -> Self {
        Self { id, name, slug }
    }

    /// Returns the tag's unique identifier.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Returns the canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the URL-safe slug derived from the name.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Renames the tag, recomputing the slug.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.slug = normalizer::slugify(&self.name);
    }
}

impl fmt::Display for Tag {
    /// Displays the capitalized name, matching the editable-text format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", normalizer::capitalize(&self.name))
    }
}

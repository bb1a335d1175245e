use crate::error::Result;
use crate::models::{EntityRef, Tag, TagId};
use crate::reconciler::{Reconciler, TagArg};
use crate::{Database, normalizer, query, vocabulary};

/// Service layer providing entity-tagging operations.
///
/// TaggingService owns a Database instance and is the host application's
/// integration surface: it scopes a [`Reconciler`] per call, owns the
/// transaction boundary for atomic set operations, and exposes the
/// field-level setter and display contracts. It is UI-independent and can
/// be used by CLI, web, or embedded hosts alike.
///
/// # Examples
///
/// ```
/// use entag::{Database, EntityRef, TaggingService};
///
/// # fn main() -> anyhow::Result<()> {
/// let db = Database::in_memory()?;
/// let service = TaggingService::new(db);
///
/// let article = EntityRef::new("article", 1);
/// service.set_tags_from_text(&article, "Rust, Web")?;
/// assert_eq!(service.tag_names(&article)?, vec!["rust", "web"]);
/// # Ok(())
/// # }
/// ```
pub struct TaggingService {
    db: Database,
}

impl TaggingService {
    /// Creates a new TaggingService with the given database.
    ///
    /// Takes ownership of the database instance; all tagging operations
    /// for that store go through the service.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    ///
    /// Useful for testing or host-side joins that need direct access.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns a reconciler scoped to the given entity.
    pub fn reconciler(&self, entity: &EntityRef) -> Reconciler<'_> {
        Reconciler::new(self.db.connection(), entity.clone())
    }

    /// Adds tags to an entity. Idempotent per tag.
    pub fn add_tags(&self, entity: &EntityRef, tags: &[TagArg]) -> Result<()> {
        self.reconciler(entity).add(tags)
    }

    /// Removes tags from an entity. Missing associations are ignored.
    pub fn remove_tags(&self, entity: &EntityRef, tags: &[TagArg]) -> Result<()> {
        self.reconciler(entity).remove(tags)
    }

    /// Removes every tag from an entity.
    pub fn clear_tags(&self, entity: &EntityRef) -> Result<()> {
        self.reconciler(entity).clear()
    }

    /// Replaces an entity's tag set, atomically.
    ///
    /// Wraps [`Reconciler::set`] in a transaction: either the whole diff
    /// applies or the prior state is left unchanged. No partial diff is
    /// ever visible to other readers of the store.
    ///
    /// # Examples
    ///
    /// ```
    /// use entag::{Database, EntityRef, TagArg, TaggingService};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let db = Database::in_memory()?;
    /// let service = TaggingService::new(db);
    /// let article = EntityRef::new("article", 1);
    ///
    /// service.set_tags(&article, &[TagArg::from("python"), TagArg::from("web")], false)?;
    /// service.set_tags(&article, &[TagArg::from("web"), TagArg::from("cli")], false)?;
    ///
    /// assert_eq!(service.tag_names(&article)?, vec!["cli", "web"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn set_tags(&self, entity: &EntityRef, tags: &[TagArg], clear: bool) -> Result<()> {
        let conn = self.db.connection();

        conn.execute("BEGIN TRANSACTION", [])?;

        let result = self.reconciler(entity).set(tags, clear);

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                Ok(())
            }
            Err(e) => {
                conn.execute("ROLLBACK", []).ok();
                Err(e)
            }
        }
    }

    /// Sets an entity's tags from raw comma-separated text.
    ///
    /// The text goes through the normalizer; the resulting names are
    /// applied as a minimal-diff set. Text that parses to no valid tag is
    /// a [`crate::TagError::Validation`] error and leaves the entity
    /// unchanged.
    ///
    /// This is the explicit replacement for assigning a string to a
    /// pseudo-field: the text path is its own method, so nothing sniffs
    /// input types at runtime.
    pub fn set_tags_from_text(&self, entity: &EntityRef, raw: &str) -> Result<()> {
        let names = normalizer::parse_required(raw, normalizer::DEFAULT_SEPARATOR)?;
        let args: Vec<TagArg> = names.into_iter().map(TagArg::from).collect();
        self.set_tags(entity, &args, false)
    }

    /// Sets an entity's tags from a list of exact names, with no re-parsing.
    ///
    /// The list counterpart of [`Self::set_tags_from_text`]: names are
    /// used verbatim (an assigned list was never parsed in the reference
    /// behavior either).
    pub fn set_tags_from_names(&self, entity: &EntityRef, names: &[&str]) -> Result<()> {
        let args: Vec<TagArg> = names.iter().map(|n| TagArg::from(*n)).collect();
        self.set_tags(entity, &args, false)
    }

    /// Returns the entity's current tags, ordered by name.
    pub fn tags_for(&self, entity: &EntityRef) -> Result<Vec<Tag>> {
        self.reconciler(entity).current()
    }

    /// Returns the entity's current tag names, ordered.
    pub fn tag_names(&self, entity: &EntityRef) -> Result<Vec<String>> {
        self.reconciler(entity).names()
    }

    /// Returns the entity's current tag slugs, ordered by name.
    pub fn tag_slugs(&self, entity: &EntityRef) -> Result<Vec<String>> {
        self.reconciler(entity).slugs()
    }

    /// Renders the entity's tag set as canonical editable text.
    ///
    /// The display contract: capitalized names, sorted, comma-joined.
    /// Parsing the result recovers the same name set.
    pub fn display_string(&self, entity: &EntityRef) -> Result<String> {
        let names = self.tag_names(entity)?;
        Ok(normalizer::format_for_display(names))
    }

    /// Returns the IDs of entities of one type carrying the given tag slug.
    pub fn entities_with_tag(&self, tag_slug: &str, entity_type: &str) -> Result<Vec<i64>> {
        query::entities_with_tag(self.db.connection(), tag_slug, entity_type)
    }

    /// Returns per-tag usage counts for one entity type.
    pub fn tag_counts(&self, entity_type: &str) -> Result<Vec<(Tag, i64)>> {
        query::tag_counts(self.db.connection(), entity_type)
    }

    /// Returns the full tag vocabulary, ordered by name.
    pub fn all_tags(&self) -> Result<Vec<Tag>> {
        vocabulary::all_tags(self.db.connection())
    }

    /// Creates a tag explicitly (administrator path), or returns the
    /// existing one with that name.
    pub fn create_tag(&self, name: &str) -> Result<Tag> {
        vocabulary::get_or_create(self.db.connection(), name)
    }

    /// Renames a tag, recomputing its slug.
    pub fn rename_tag(&self, id: TagId, new_name: &str) -> Result<Tag> {
        vocabulary::rename(self.db.connection(), id, new_name)
    }

    /// Deletes a tag and, via cascade, all its associations.
    pub fn delete_tag(&self, id: TagId) -> Result<()> {
        vocabulary::delete_tag(self.db.connection(), id)
    }

    /// Deletes every tag with zero associations and returns the names
    /// removed.
    ///
    /// Orphan tags are a durable vocabulary by default and nothing calls
    /// this implicitly; it exists for hosts that want explicit garbage
    /// collection.
    pub fn prune_unused_tags(&self) -> Result<Vec<String>> {
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT name FROM tags
             WHERE id NOT IN (SELECT DISTINCT tag_id FROM taggings)
             ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut pruned: Vec<String> = Vec::new();
        for row in rows {
            pruned.push(row?);
        }

        conn.execute(
            "DELETE FROM tags WHERE id NOT IN (SELECT DISTINCT tag_id FROM taggings)",
            [],
        )?;

        Ok(pruned)
    }

    /// Validates a prospective exact tag name without touching the store.
    ///
    /// Convenience for boundary layers that want to reject input before
    /// opening a transaction.
    pub fn is_valid_tag_name(name: &str) -> bool {
        normalizer::is_valid_name(&name.to_lowercase())
    }
}

//! Tag-set reconciliation: minimal add/remove diffs for one entity.
//!
//! The reconciler is a stateless transformation over the vocabulary and
//! association stores, scoped to a single entity reference per value. It
//! holds no persistent state and borrows the connection, so the caller
//! decides the transaction scope; [`crate::TaggingService::set_tags`]
//! wraps [`Reconciler::set`] in a transaction to make it atomic.

use std::collections::BTreeMap;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;
use crate::models::{EntityRef, Tag, TagId};
use crate::{associations, vocabulary};

/// One desired or undesired tag, as callers express it.
///
/// Either an exact name or an already-resolved tag record. Names given
/// here are exact vocabulary names, NOT free text: only the text path
/// ([`crate::TaggingService::set_tags_from_text`]) runs the normalizer.
/// The closed enum replaces runtime type-sniffing; anything that is not a
/// name or a record is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum TagArg {
    /// An exact tag name, created in the vocabulary if missing.
    Name(String),
    /// An already-resolved tag record.
    Record(Tag),
}

impl From<&str> for TagArg {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TagArg {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Tag> for TagArg {
    fn from(tag: Tag) -> Self {
        Self::Record(tag)
    }
}

/// Reconciles the tag set of one entity against the stores.
pub struct Reconciler<'c> {
    conn: &'c Connection,
    entity: EntityRef,
}

impl<'c> Reconciler<'c> {
    /// Creates a reconciler scoped to one entity reference.
    pub fn new(conn: &'c Connection, entity: EntityRef) -> Self {
        Self { conn, entity }
    }

    /// Returns the entity this reconciler is scoped to.
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// Adds tags to the entity.
    ///
    /// Name arguments are resolved through the vocabulary with
    /// create-if-missing semantics, then unioned with record arguments.
    /// Every member of the union is upserted, so adding tags already
    /// present is a safe no-op for those tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use entag::{Database, EntityRef, Reconciler, TagArg};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let db = Database::in_memory()?;
    /// let rec = Reconciler::new(db.connection(), EntityRef::new("article", 1));
    ///
    /// rec.add(&[TagArg::from("rust"), TagArg::from("web")])?;
    /// rec.add(&[TagArg::from("rust")])?; // idempotent
    ///
    /// assert_eq!(rec.names()?, vec!["rust", "web"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn add(&self, tags: &[TagArg]) -> Result<()> {
        let resolved = self.resolve(tags)?;
        for tag in resolved.values() {
            associations::upsert(self.conn, &self.entity, tag.id())?;
        }
        Ok(())
    }

    /// Replaces the entity's tag set with the desired one.
    ///
    /// With `clear`, every existing association is deleted and the desired
    /// set added wholesale. Otherwise the minimal diff is computed: tags
    /// present in both old and new sets are left untouched (their
    /// association rows survive with metadata intact), the rest of the old
    /// set is removed, and the new-only tags are added.
    ///
    /// Callers wanting all-or-nothing visibility must wrap this in a
    /// transaction; see [`crate::TaggingService::set_tags`].
    pub fn set(&self, tags: &[TagArg], clear: bool) -> Result<()> {
        if clear {
            self.clear()?;
            return self.add(tags);
        }

        let desired = self.resolve(tags)?;
        let old = associations::find(self.conn, &self.entity, None)?;

        let mut to_remove: Vec<TagId> = Vec::new();
        for tag in &old {
            if !desired.contains_key(&tag.id()) {
                to_remove.push(tag.id());
            }
        }

        let mut to_add: Vec<TagId> = Vec::new();
        for (id, _) in &desired {
            if !old.iter().any(|t| t.id() == *id) {
                to_add.push(*id);
            }
        }

        debug!(
            entity = %self.entity,
            removing = to_remove.len(),
            adding = to_add.len(),
            unchanged = old.len() - to_remove.len(),
            "reconciling tag set"
        );

        associations::delete_by_ids(self.conn, &self.entity, &to_remove)?;
        for id in to_add {
            associations::upsert(self.conn, &self.entity, id)?;
        }

        Ok(())
    }

    /// Removes tags from the entity.
    ///
    /// Name and record arguments are deleted in up to two store calls.
    /// Non-existent associations are silently ignored.
    pub fn remove(&self, tags: &[TagArg]) -> Result<()> {
        let mut names: Vec<&str> = Vec::new();
        let mut ids: Vec<TagId> = Vec::new();

        for tag in tags {
            match tag {
                TagArg::Name(name) => names.push(name),
                TagArg::Record(tag) => ids.push(tag.id()),
            }
        }

        associations::delete_by_names(self.conn, &self.entity, &names)?;
        associations::delete_by_ids(self.conn, &self.entity, &ids)?;
        Ok(())
    }

    /// Removes every tag from the entity.
    pub fn clear(&self) -> Result<()> {
        associations::delete_all(self.conn, &self.entity)
    }

    /// Returns the entity's current tags, ordered by name.
    pub fn current(&self) -> Result<Vec<Tag>> {
        associations::find(self.conn, &self.entity, None)
    }

    /// Returns the entity's current tag names, ordered.
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self
            .current()?
            .into_iter()
            .map(|t| t.name().to_string())
            .collect())
    }

    /// Returns the entity's current tag slugs, ordered by name.
    pub fn slugs(&self) -> Result<Vec<String>> {
        Ok(self
            .current()?
            .into_iter()
            .map(|t| t.slug().to_string())
            .collect())
    }

    /// Resolves mixed arguments into one record per distinct tag.
    ///
    /// Names go through the vocabulary (create-if-missing); records pass
    /// straight through. Keying by `TagId` gives set semantics: a tag
    /// supplied twice, or both as name and record, appears once.
    fn resolve(&self, tags: &[TagArg]) -> Result<BTreeMap<TagId, Tag>> {
        let mut names: Vec<&str> = Vec::new();
        let mut resolved: BTreeMap<TagId, Tag> = BTreeMap::new();

        for tag in tags {
            match tag {
                TagArg::Name(name) => names.push(name),
                TagArg::Record(tag) => {
                    resolved.insert(tag.id(), tag.clone());
                }
            }
        }

        for tag in vocabulary::get_or_create_many(self.conn, names)? {
            resolved.insert(tag.id(), tag);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn reconciler(db: &Database) -> Reconciler<'_> {
        Reconciler::new(db.connection(), EntityRef::new("article", 7))
    }

    #[test]
    fn add_creates_missing_tags_and_associations() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.add(&["rust".into(), "web".into()]).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["rust", "web"]);
        assert!(vocabulary::find_by_name(db.connection(), "rust")
            .unwrap()
            .is_some());
    }

    #[test]
    fn add_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.add(&["rust".into()]).unwrap();
        rec.add(&["rust".into()]).unwrap();

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM taggings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn add_accepts_mixed_names_and_records() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);
        let web = vocabulary::get_or_create(db.connection(), "web").unwrap();

        rec.add(&["rust".into(), web.clone().into()]).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["rust", "web"]);
    }

    #[test]
    fn add_unions_name_and_record_for_same_tag() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);
        let web = vocabulary::get_or_create(db.connection(), "web").unwrap();

        rec.add(&["web".into(), web.into()]).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["web"]);
    }

    #[test]
    fn set_applies_minimal_diff() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.set(&["a".into(), "b".into()], false).unwrap();
        rec.set(&["a".into(), "c".into()], false).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn set_leaves_surviving_association_rows_untouched() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.set(&["a".into(), "b".into()], false).unwrap();

        let a = vocabulary::find_by_name(db.connection(), "a").unwrap().unwrap();
        let entity = EntityRef::new("article", 7);
        let rowid_before: i64 = db
            .connection()
            .query_row(
                "SELECT rowid FROM taggings WHERE tag_id = ?1 AND entity_type = 'article' AND entity_id = 7",
                [a.id().get()],
                |row| row.get(0),
            )
            .unwrap();
        let stamp_before = associations::created_at(db.connection(), &entity, a.id())
            .unwrap()
            .unwrap();

        rec.set(&["a".into(), "c".into()], false).unwrap();

        let rowid_after: i64 = db
            .connection()
            .query_row(
                "SELECT rowid FROM taggings WHERE tag_id = ?1 AND entity_type = 'article' AND entity_id = 7",
                [a.id().get()],
                |row| row.get(0),
            )
            .unwrap();
        let stamp_after = associations::created_at(db.connection(), &entity, a.id())
            .unwrap()
            .unwrap();

        // Surviving tag was neither deleted nor recreated
        assert_eq!(rowid_before, rowid_after);
        assert_eq!(stamp_before, stamp_after);
    }

    #[test]
    fn set_with_clear_replaces_everything() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.set(&["a".into(), "b".into()], false).unwrap();
        rec.set(&["c".into()], true).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["c"]);
    }

    #[test]
    fn set_matches_duplicate_desired_tags_once() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.set(&["web".into(), "web".into(), "Web".into()], false)
            .unwrap();

        assert_eq!(rec.names().unwrap(), vec!["web"]);
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn set_scenario_python_web_to_web_cli() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.set(&["python".into(), "web".into()], false).unwrap();
        rec.set(&["web".into(), "cli".into()], false).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["cli", "web"]);
        // "python" tag survives in the vocabulary as an orphan
        assert!(vocabulary::find_by_name(db.connection(), "python")
            .unwrap()
            .is_some());
    }

    #[test]
    fn remove_handles_names_and_records() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.add(&["rust".into(), "web".into(), "cli".into()]).unwrap();
        let web = vocabulary::find_by_name(db.connection(), "web").unwrap().unwrap();

        rec.remove(&["rust".into(), web.into()]).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["cli"]);
    }

    #[test]
    fn remove_ignores_missing_associations() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.add(&["rust".into()]).unwrap();
        rec.remove(&["nonexistent".into()]).unwrap();

        assert_eq!(rec.names().unwrap(), vec!["rust"]);
    }

    #[test]
    fn clear_removes_all_associations() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.add(&["rust".into(), "web".into()]).unwrap();
        rec.clear().unwrap();

        assert!(rec.names().unwrap().is_empty());
    }

    #[test]
    fn slugs_projects_current_tags() {
        let db = Database::in_memory().unwrap();
        let rec = reconciler(&db);

        rec.add(&["machine learning".into(), "web".into()]).unwrap();

        assert_eq!(rec.slugs().unwrap(), vec!["machine_learning", "web"]);
    }

    #[test]
    fn reconcilers_for_different_entities_are_independent() {
        let db = Database::in_memory().unwrap();
        let article = Reconciler::new(db.connection(), EntityRef::new("article", 1));
        let photo = Reconciler::new(db.connection(), EntityRef::new("photo", 1));

        article.add(&["rust".into()]).unwrap();
        photo.add(&["sunset".into()]).unwrap();

        article.clear().unwrap();

        assert!(article.names().unwrap().is_empty());
        assert_eq!(photo.names().unwrap(), vec!["sunset"]);
    }
}

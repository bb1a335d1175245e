//! Tag vocabulary store: the shared, uniquely-named tag namespace.
//!
//! All functions operate on a borrowed [`rusqlite::Connection`] so callers
//! control transaction scope. Concurrent creators of the same name are
//! resolved to a single winning row by the `UNIQUE COLLATE NOCASE`
//! constraint plus a conflict-tolerant insert and a single re-fetch.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Result, TagError};
use crate::models::{Tag, TagId};
use crate::normalizer;

/// Looks up a tag by name (case-insensitive).
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT id, name, slug FROM tags WHERE name = ?1 COLLATE NOCASE",
            [name],
            row_to_tag,
        )
        .optional()?;
    Ok(tag)
}

/// Looks up a tag by slug.
pub fn find_by_slug(conn: &Connection, slug: &str) -> Result<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT id, name, slug FROM tags WHERE slug = ?1",
            [slug],
            row_to_tag,
        )
        .optional()?;
    Ok(tag)
}

/// Gets an existing tag by exact name, or creates it.
///
/// The insert is atomic insert-if-absent: a uniqueness conflict means
/// someone else just created the tag, and the follow-up fetch returns the
/// winning row. No retry loop is needed beyond that single re-fetch.
///
/// Blank names are rejected with [`TagError::InvalidTagName`].
///
/// # Examples
///
/// ```
/// use entag::{Database, vocabulary};
///
/// # fn main() -> anyhow::Result<()> {
/// let db = Database::in_memory()?;
/// let first = vocabulary::get_or_create(db.connection(), "rust")?;
/// let second = vocabulary::get_or_create(db.connection(), "rust")?;
/// assert_eq!(first.id(), second.id());
/// # Ok(())
/// # }
/// ```
pub fn get_or_create(conn: &Connection, name: &str) -> Result<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TagError::InvalidTagName(name.to_string()));
    }

    let slug = normalizer::slugify(name);
    let inserted = conn.execute(
        "INSERT INTO tags (name, slug) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        [name, slug.as_str()],
    )?;
    if inserted > 0 {
        debug!(name, slug, "created tag");
    }

    // Either we just inserted it or a concurrent caller won the race;
    // the NOCASE fetch returns the single canonical row either way.
    find_by_name(conn, name)?
        .ok_or_else(|| TagError::Database(rusqlite::Error::QueryReturnedNoRows))
}

/// Gets or creates tags for every distinct name in the input.
///
/// Names are deduplicated case-insensitively before hitting the store, so
/// a caller supplying `["Web", "web"]` gets one tag back. Result order
/// follows first occurrence in the input.
pub fn get_or_create_many<I, S>(conn: &Connection, names: I) -> Result<Vec<Tag>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut tags = Vec::new();

    for name in names {
        let name = name.as_ref().trim();
        if !seen.insert(name.to_lowercase()) {
            continue;
        }
        tags.push(get_or_create(conn, name)?);
    }

    Ok(tags)
}

/// Returns the full vocabulary ordered by name, then slug.
pub fn all_tags(conn: &Connection) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name, slug FROM tags ORDER BY name, slug")?;
    let rows = stmt.query_map([], row_to_tag)?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// Renames a tag, recomputing its slug from the new name.
///
/// Saving always rederives the slug; the two columns can never diverge.
/// A rename that collides with an existing name surfaces the storage
/// error unchanged (this is an explicit admin operation, not a race).
pub fn rename(conn: &Connection, id: TagId, new_name: &str) -> Result<Tag> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(TagError::InvalidTagName(new_name.to_string()));
    }

    let slug = normalizer::slugify(new_name);
    conn.execute(
        "UPDATE tags SET name = ?1, slug = ?2 WHERE id = ?3",
        rusqlite::params![new_name, slug, id.get()],
    )?;

    conn.query_row(
        "SELECT id, name, slug FROM tags WHERE id = ?1",
        [id.get()],
        row_to_tag,
    )
    .map_err(Into::into)
}

/// Deletes a tag from the vocabulary.
///
/// Cascades to any associations referencing it. Idempotent: deleting a
/// missing tag is a no-op. Tags are never deleted implicitly; an
/// unreferenced tag persists until an administrator removes it.
pub fn delete_tag(conn: &Connection, id: TagId) -> Result<()> {
    conn.execute("DELETE FROM tags WHERE id = ?1", [id.get()])?;
    Ok(())
}

fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag::from_row(
        TagId::new(row.get(0)?),
        row.get(1)?,
        row.get(2)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn get_or_create_inserts_new_tag_with_slug() {
        let db = Database::in_memory().unwrap();
        let tag = get_or_create(db.connection(), "machine learning").unwrap();

        assert_eq!(tag.name(), "machine learning");
        assert_eq!(tag.slug(), "machine_learning");
    }

    #[test]
    fn get_or_create_returns_existing_tag() {
        let db = Database::in_memory().unwrap();
        let first = get_or_create(db.connection(), "rust").unwrap();
        let second = get_or_create(db.connection(), "rust").unwrap();

        assert_eq!(first.id(), second.id());

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn get_or_create_resolves_case_variants_to_one_row() {
        let db = Database::in_memory().unwrap();
        let lower = get_or_create(db.connection(), "web").unwrap();
        let upper = get_or_create(db.connection(), "WEB").unwrap();

        assert_eq!(lower.id(), upper.id());
        // The first writer's spelling wins
        assert_eq!(upper.name(), "web");
    }

    #[test]
    fn get_or_create_rejects_blank_name() {
        let db = Database::in_memory().unwrap();

        let err = get_or_create(db.connection(), "   ").unwrap_err();
        assert!(matches!(err, TagError::InvalidTagName(_)));
    }

    #[test]
    fn get_or_create_many_deduplicates_case_insensitively() {
        let db = Database::in_memory().unwrap();
        let tags = get_or_create_many(db.connection(), ["Web", "web", "cli"]).unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name(), "Web");
        assert_eq!(tags[1].name(), "cli");
    }

    #[test]
    fn get_or_create_many_preserves_first_occurrence_order() {
        let db = Database::in_memory().unwrap();
        let tags = get_or_create_many(db.connection(), ["zebra", "apple", "zebra"]).unwrap();

        let names: Vec<&str> = tags.iter().map(Tag::name).collect();
        assert_eq!(names, vec!["zebra", "apple"]);
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let db = Database::in_memory().unwrap();
        get_or_create(db.connection(), "rust").unwrap();

        let found = find_by_name(db.connection(), "RUST").unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name(), "rust");
    }

    #[test]
    fn find_by_slug_locates_tag() {
        let db = Database::in_memory().unwrap();
        get_or_create(db.connection(), "machine learning").unwrap();

        let found = find_by_slug(db.connection(), "machine_learning").unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name(), "machine learning");

        assert!(find_by_slug(db.connection(), "missing").unwrap().is_none());
    }

    #[test]
    fn all_tags_ordered_by_name() {
        let db = Database::in_memory().unwrap();
        get_or_create_many(db.connection(), ["web", "cli", "rust"]).unwrap();

        let names: Vec<String> = all_tags(db.connection())
            .unwrap()
            .into_iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["cli", "rust", "web"]);
    }

    #[test]
    fn rename_recomputes_slug() {
        let db = Database::in_memory().unwrap();
        let tag = get_or_create(db.connection(), "old name").unwrap();

        let renamed = rename(db.connection(), tag.id(), "new name").unwrap();
        assert_eq!(renamed.name(), "new name");
        assert_eq!(renamed.slug(), "new_name");

        // Stored slug matches the derived one
        let stored: String = db
            .connection()
            .query_row("SELECT slug FROM tags WHERE id = ?1", [tag.id().get()], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(stored, "new_name");
    }

    #[test]
    fn delete_tag_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let tag = get_or_create(db.connection(), "rust").unwrap();

        delete_tag(db.connection(), tag.id()).unwrap();
        delete_tag(db.connection(), tag.id()).unwrap();

        assert!(find_by_name(db.connection(), "rust").unwrap().is_none());
    }
}

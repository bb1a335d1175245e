//! Association store: durable links between tags and entity references.
//!
//! Uniqueness is enforced by the `(tag_id, entity_type, entity_id)`
//! primary key; `upsert` and the delete operations are idempotent so the
//! reconciler can apply diffs without pre-checking existence.

use rusqlite::{Connection, OptionalExtension, ToSql, params_from_iter};
use time::OffsetDateTime;

use crate::error::Result;
use crate::models::{EntityRef, Tag, TagId};

/// Returns the tags currently associated with an entity, ordered by name.
///
/// With `name_filter`, only associations whose tag name matches one of the
/// given names (case-insensitively) are returned.
pub fn find(
    conn: &Connection,
    entity: &EntityRef,
    name_filter: Option<&[&str]>,
) -> Result<Vec<Tag>> {
    let mut sql = String::from(
        "SELECT t.id, t.name, t.slug
         FROM taggings tg
         JOIN tags t ON tg.tag_id = t.id
         WHERE tg.entity_type = ?1 AND tg.entity_id = ?2",
    );

    let mut params: Vec<Box<dyn ToSql>> = vec![
        Box::new(entity.entity_type().to_string()),
        Box::new(entity.entity_id()),
    ];

    if let Some(names) = name_filter {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders: Vec<String> = (0..names.len())
            .map(|i| format!("?{}", i + 3))
            .collect();
        sql.push_str(&format!(" AND t.name IN ({})", placeholders.join(", ")));
        for name in names {
            params.push(Box::new(name.to_string()));
        }
    }

    sql.push_str(" ORDER BY t.name");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        Ok(Tag::from_row(
            TagId::new(row.get(0)?),
            row.get(1)?,
            row.get(2)?,
        ))
    })?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(row?);
    }
    Ok(tags)
}

/// Associates a tag with an entity, if not already associated.
///
/// Atomic insert-if-absent: a duplicate under race hits the composite
/// primary key and is ignored, never raised.
pub fn upsert(conn: &Connection, entity: &EntityRef, tag_id: TagId) -> Result<()> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT OR IGNORE INTO taggings (tag_id, entity_type, entity_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![tag_id.get(), entity.entity_type(), entity.entity_id(), now],
    )?;
    Ok(())
}

/// Removes the entity's associations whose tag names match (case-insensitively).
///
/// Absent associations are not an error.
pub fn delete_by_names(conn: &Connection, entity: &EntityRef, names: &[&str]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }

    let placeholders: Vec<String> = (0..names.len())
        .map(|i| format!("?{}", i + 3))
        .collect();
    let sql = format!(
        "DELETE FROM taggings
         WHERE entity_type = ?1 AND entity_id = ?2
           AND tag_id IN (SELECT id FROM tags WHERE name IN ({}))",
        placeholders.join(", ")
    );

    let mut params: Vec<Box<dyn ToSql>> = vec![
        Box::new(entity.entity_type().to_string()),
        Box::new(entity.entity_id()),
    ];
    for name in names {
        params.push(Box::new(name.to_string()));
    }

    conn.execute(&sql, params_from_iter(params.iter()))?;
    Ok(())
}

/// Removes the entity's associations for the given tag IDs.
///
/// Absent associations are not an error.
pub fn delete_by_ids(conn: &Connection, entity: &EntityRef, ids: &[TagId]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let placeholders: Vec<String> = (0..ids.len())
        .map(|i| format!("?{}", i + 3))
        .collect();
    let sql = format!(
        "DELETE FROM taggings
         WHERE entity_type = ?1 AND entity_id = ?2 AND tag_id IN ({})",
        placeholders.join(", ")
    );

    let mut params: Vec<Box<dyn ToSql>> = vec![
        Box::new(entity.entity_type().to_string()),
        Box::new(entity.entity_id()),
    ];
    for id in ids {
        params.push(Box::new(id.get()));
    }

    conn.execute(&sql, params_from_iter(params.iter()))?;
    Ok(())
}

/// Removes every association for the entity.
pub fn delete_all(conn: &Connection, entity: &EntityRef) -> Result<()> {
    conn.execute(
        "DELETE FROM taggings WHERE entity_type = ?1 AND entity_id = ?2",
        rusqlite::params![entity.entity_type(), entity.entity_id()],
    )?;
    Ok(())
}

/// Returns when a tag was associated with an entity (unix seconds).
///
/// `None` when no such association exists. Exposed so hosts and tests can
/// observe that reconciliation leaves surviving associations untouched.
pub fn created_at(conn: &Connection, entity: &EntityRef, tag_id: TagId) -> Result<Option<i64>> {
    let created = conn
        .query_row(
            "SELECT created_at FROM taggings
             WHERE tag_id = ?1 AND entity_type = ?2 AND entity_id = ?3",
            rusqlite::params![tag_id.get(), entity.entity_type(), entity.entity_id()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(created)
}

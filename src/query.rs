//! Read-side facade: lookups that cross from tags to entities and back.

use rusqlite::Connection;

use crate::associations;
use crate::error::Result;
use crate::models::{EntityRef, Tag, TagId};

/// Returns the tags associated with one entity, ordered by name.
///
/// `name_filter` ANDs an extra predicate into the join: only tags whose
/// name matches one of the given names are returned.
pub fn tags_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: i64,
    name_filter: Option<&[&str]>,
) -> Result<Vec<Tag>> {
    let entity = EntityRef::new(entity_type, entity_id);
    associations::find(conn, &entity, name_filter)
}

/// Returns the IDs of entities of one type carrying the tag with the given
/// slug, ordered ascending.
///
/// The inverse lookup used by list-view adapters: the host maps the IDs
/// back to its own objects.
pub fn entities_with_tag(conn: &Connection, tag_slug: &str, entity_type: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT tg.entity_id
         FROM taggings tg
         JOIN tags t ON tg.tag_id = t.id
         WHERE t.slug = ?1 AND tg.entity_type = ?2
         ORDER BY tg.entity_id",
    )?;
    let rows = stmt.query_map([tag_slug, entity_type], |row| row.get(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Returns each tag used on the given entity type with its usage count,
/// ordered by count descending, then name.
pub fn tag_counts(conn: &Connection, entity_type: &str) -> Result<Vec<(Tag, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.slug, COUNT(*) AS uses
         FROM taggings tg
         JOIN tags t ON tg.tag_id = t.id
         WHERE tg.entity_type = ?1
         GROUP BY t.id
         ORDER BY uses DESC, t.name",
    )?;
    let rows = stmt.query_map([entity_type], |row| {
        Ok((
            Tag::from_row(TagId::new(row.get(0)?), row.get(1)?, row.get(2)?),
            row.get(3)?,
        ))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}

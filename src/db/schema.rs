/// Complete database schema for the tagging store.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// All statements are designed to be run in a single batch.
pub const INITIAL_SCHEMA: &str = r#"
-- Tag vocabulary: unique names (case-insensitive) with derived slugs
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    slug TEXT NOT NULL UNIQUE
);

-- Polymorphic association table: links tags to host entities by
-- (entity_type, entity_id) discriminator pair
CREATE TABLE IF NOT EXISTS taggings (
    tag_id INTEGER NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (tag_id, entity_type, entity_id),
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

-- Index for looking up all tags on one entity
CREATE INDEX IF NOT EXISTS idx_taggings_entity ON taggings(entity_type, entity_id);

-- Index for the inverse lookup (entities carrying one tag)
CREATE INDEX IF NOT EXISTS idx_taggings_tag ON taggings(tag_id);
"#;

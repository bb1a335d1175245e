use thiserror::Error;

/// Errors surfaced by the tagging core.
///
/// Uniqueness violations on tag names or associations are deliberately
/// absent: concurrent-creation races are absorbed inside the stores with
/// conflict-tolerant SQL and a single re-fetch, never surfaced to callers.
#[derive(Debug, Error)]
pub enum TagError {
    /// Raw tag text failed to yield at least one valid tag where one was
    /// required.
    #[error("no valid tags in input: {0:?}")]
    Validation(String),

    /// A blank or empty exact name was passed to the vocabulary. This is a
    /// caller contract violation and is rejected immediately.
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),

    /// Underlying storage failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored timestamp outside the representable range.
    #[error("timestamp error: {0}")]
    Timestamp(#[from] time::error::ComponentRange),
}

/// Convenience alias used throughout the core modules.
pub type Result<T> = std::result::Result<T, TagError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    /// No record matches the lookup. Handlers never produce it; lookups and
    /// fixture code do.
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("unexpected storage error: {0}")]
    Unexpected(String),
}

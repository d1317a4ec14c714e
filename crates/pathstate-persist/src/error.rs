use pathstate_store::StoreError;

/// Errors from reading or writing persisted snapshots.
///
/// These never reach callers of a container: loading falls back to the
/// initial state and the throttled writer logs failed writes.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The session store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The stored snapshot is not valid JSON, or the tree could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

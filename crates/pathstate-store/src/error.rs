/// Errors from session store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is empty or contains characters the backend cannot store.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry is not valid UTF-8 text.
    #[error("corrupt entry {key:?}: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// A lock protecting the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

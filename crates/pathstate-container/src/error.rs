use pathstate_types::OperationKind;
use pathstate_validate::ValidationError;

/// Errors surfaced to callers of a state container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// The call was rejected before it was enqueued.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operation cannot be applied at all; this is a bug in the caller.
    #[error("programming error: {0}")]
    Programming(ApplyError),

    /// The container has been closed and accepts no more operations.
    #[error("state container is closed")]
    Closed,

    /// Container options could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Why an operation could not be applied to the committed tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The payload variant does not belong to the operation kind.
    #[error("{operation} cannot take {payload} as payload")]
    PayloadMismatch {
        operation: OperationKind,
        payload: &'static str,
    },

    /// A read-only kind was submitted for ordering.
    #[error("{0} is read-only and never goes through the serializer")]
    ReadOnly(OperationKind),

    /// A caller-supplied callback panicked while the operation was applied.
    #[error("{operation} callback panicked: {message}")]
    Panicked {
        operation: OperationKind,
        message: String,
    },

    /// The value at the path has the wrong shape.
    ///
    /// Only reachable with validation off, or when an earlier queued operation
    /// changed the value after validation ran.
    #[error("{operation} expected {expected} at {path}, found {actual}")]
    Shape {
        operation: OperationKind,
        path: String,
        expected: &'static str,
        actual: String,
    },
}

impl ApplyError {
    /// Returns `true` for errors that indicate a bug rather than a runtime
    /// condition.
    pub fn is_programming(&self) -> bool {
        !matches!(self, Self::Shape { .. })
    }
}

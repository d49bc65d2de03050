/// Errors from ledger state operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A composite key attribute contains a reserved code point.
    #[error("invalid composite key attribute {attribute:?}: {reason}")]
    InvalidAttribute { attribute: String, reason: String },

    /// Composite keys need a non-empty index name.
    #[error("composite key index name must not be empty")]
    EmptyIndexName,

    /// A key handed to the codec is not a composite key.
    #[error("malformed composite key: {0:?}")]
    MalformedKey(String),

    /// State keys must be non-empty.
    #[error("state key must not be empty")]
    EmptyKey,

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A key read by the transaction changed before it committed.
    #[error("read conflict on key {0:?}: value changed since it was read")]
    Conflict(String),

    /// The backend refused a write.
    #[error("write rejected for key {key:?}: {reason}")]
    WriteRejected { key: String, reason: String },

    /// A lock guarding in-memory state was poisoned.
    #[error("state lock poisoned")]
    LockPoisoned,

    /// I/O error from a file-backed snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

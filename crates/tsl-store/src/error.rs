/// Errors from chain store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure while encoding the chain document.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The document is readable but the block at `position` is not. The
    /// stored bytes are left untouched.
    #[error("block {position} is malformed: {reason}")]
    MalformedBlock { position: u64, reason: String },

    /// Storage backend refuses writes.
    #[error("store is read-only")]
    ReadOnly,

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

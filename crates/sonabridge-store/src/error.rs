//! Error types for the store crate.

use thiserror::Error;

/// Errors that can occur opening or migrating a session token store.
///
/// Per-operation storage failures are not surfaced through this type; they
/// are logged and the operation returns a safe default. Only construction
/// and migration propagate errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or statement failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store's handle has been released via `close`.
    #[error("store is closed")]
    Closed,
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

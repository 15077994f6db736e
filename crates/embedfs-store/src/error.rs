//! Error types for the store crate.

use thiserror::Error;

/// A lookup that matched nothing.
///
/// Both outcomes are ordinary: callers are expected to branch on them, for
/// example to fall back to another resource source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum NotFound {
    /// The bucket argument matches no registered bucket.
    #[error("bucket not found")]
    Bucket,

    /// No bin with that name exists in the searched scope.
    #[error("entry not found")]
    Entry,
}

/// Errors that can occur when building, parsing or accessing a blob.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] embedfs_common::Error),

    /// The blob does not follow the wire format.
    #[error("malformed blob at offset {offset}: {reason}")]
    MalformedFormat { offset: usize, reason: String },

    /// A name does not fit the one-byte length prefix.
    #[error("name is {len} bytes long, the format allows at most 255")]
    NameTooLong { len: usize },

    /// A payload or count does not fit a 32-bit field.
    #[error("{what} of {len} does not fit in a 32-bit field")]
    TooLarge { what: &'static str, len: usize },

    /// The embedded store was accessed before `initialize`.
    #[error("embedded store is not initialized")]
    NotInitialized,

    /// `initialize` was called more than once.
    #[error("embedded store is already initialized")]
    AlreadyInitialized,

    /// Lookup miss.
    #[error(transparent)]
    NotFound(#[from] NotFound),
}

impl Error {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedFormat {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

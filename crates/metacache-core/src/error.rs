//! Error types for cache operations.

use thiserror::Error;

/// Errors returned by [`FileCache`](crate::FileCache) implementations.
///
/// Lookups that simply find nothing are not errors; they return `Ok(None)`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The path the operation needs does not exist in the cache.
    #[error("Path not found in cache: {path}")]
    NotFound {
        /// The path that was looked up.
        path: String,
    },

    /// An entry already exists at the target path.
    #[error("Entry already exists: {path}")]
    AlreadyExists {
        /// The conflicting path.
        path: String,
    },

    /// Insert was missing a field every complete entry needs.
    #[error("Cannot insert {path}: missing required field '{field}'")]
    MissingField {
        /// The path being inserted.
        path: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A search pattern could not be compiled.
    #[error("Invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as supplied by the caller.
        pattern: String,
        /// Underlying glob compilation error.
        #[source]
        source: globset::Error,
    },

    /// Storage-level failure reported by a cache backend.
    #[error("Cache storage error: {0}")]
    Storage(String),
}

impl CacheError {
    /// Creates a [`CacheError::NotFound`] for `path`.
    pub fn not_found(path: impl Into<String>) -> Self {
        CacheError::NotFound { path: path.into() }
    }

    /// Creates a [`CacheError::AlreadyExists`] for `path`.
    pub fn already_exists(path: impl Into<String>) -> Self {
        CacheError::AlreadyExists { path: path.into() }
    }

    /// Returns true if this error means the path is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

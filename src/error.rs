//! Error types for eagle-db.
//!
//! All errors are strongly typed using thiserror, so callers can match on
//! the failing condition instead of parsing messages. Backend failures are
//! reported as [`StorageError`] and wrapped into [`DatabaseError`] at the
//! public API boundary.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Top-level error type for eagle-db.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database file could not be opened.
    #[error("Cannot open database '{}': {reason}", path.display())]
    FileAccess {
        /// Path that was requested.
        path: PathBuf,
        /// Why it could not be opened.
        reason: String,
    },

    /// The file is readable but lacks the expected structure.
    #[error("Schema error: {reason}")]
    Schema {
        /// What is missing or malformed.
        reason: String,
    },

    /// No subgroup exists for the requested starting point.
    #[error("Subgroup {subgroup_number} not found in snapshot {snapshot}")]
    NotFound {
        /// Position of the subgroup within its snapshot.
        subgroup_number: usize,
        /// Snapshot number.
        snapshot: u32,
    },

    /// The requested per-subhalo property is not part of the catalogue.
    #[error("Property '{name}' not found in catalogue")]
    PropertyNotFound {
        /// Requested property name.
        name: String,
    },

    /// Raw dataset access for a path that does not exist.
    #[error("No dataset at '{path}'")]
    DatasetNotFound {
        /// Requested dataset path.
        path: String,
    },

    /// A time coordinate name could not be parsed.
    #[error("Unknown time coordinate '{value}' (expected Redshift, ExpansionFactor or UniverseAge)")]
    InvalidTimeCoordinate {
        /// The string that failed to parse.
        value: String,
    },

    /// A scalar operation was requested on a vector-valued property.
    #[error("Property '{property}' has {width} components per subhalo; a scalar property is required")]
    NotScalar {
        /// Property name.
        property: String,
        /// Number of components per row.
        width: usize,
    },

    /// A configuration value is invalid.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Which setting is invalid and why.
        reason: String,
    },

    /// Rendering a plot failed.
    #[error("Plot error: {message}")]
    Plot {
        /// Backend message.
        message: String,
    },

    /// Backend failure while reading the catalogue.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DatabaseError {
    /// Creates a schema error.
    #[must_use]
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }

    /// Creates a file access error.
    #[must_use]
    pub fn file_access(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileAccess {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a file access error.
    #[must_use]
    pub const fn is_file_access(&self) -> bool {
        matches!(self, Self::FileAccess { .. })
    }

    /// Returns true if this is a schema error.
    #[must_use]
    pub const fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Returns true if the requested subgroup does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the requested property does not exist.
    #[must_use]
    pub const fn is_property_not_found(&self) -> bool {
        matches!(self, Self::PropertyNotFound { .. })
    }

    /// Returns true if this error came from the storage backend.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias for eagle-db operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

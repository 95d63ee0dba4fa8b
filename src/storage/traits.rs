//! Abstract catalogue source trait.
//!
//! A catalogue is a read-only tree of groups holding attributes and
//! datasets, addressed by `/`-separated paths. The trait lets the
//! [`Database`](crate::Database) run unchanged over:
//! - The HDF5 file backend (feature `hdf5`)
//! - The in-memory backend for tests, fixtures and embedded use

use std::collections::BTreeMap;

use thiserror::Error;

use crate::column::{AttributeValue, Column};

/// Errors that can occur while reading from a catalogue source.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Dataset not found.
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Attribute not found.
    #[error("Attribute '{name}' not found on group '{group}'")]
    AttributeNotFound {
        /// Group the attribute was looked up on.
        group: String,
        /// Attribute name.
        name: String,
    },

    /// Dataset element type the reader cannot represent.
    #[error("Unsupported element type for '{path}': {dtype}")]
    UnsupportedType {
        /// Dataset path.
        path: String,
        /// Description of the stored type.
        dtype: String,
    },

    /// Row index past the end of a dataset.
    #[error("Row {row} out of range for dataset of {len} rows")]
    RowOutOfRange {
        /// Requested row.
        row: usize,
        /// Dataset length.
        len: usize,
    },

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Shape of a dataset without reading its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetShape {
    /// Number of rows.
    pub rows: usize,
    /// Components per row; 1 for one-dimensional datasets.
    pub width: usize,
}

/// Read-only access to a hierarchical catalogue.
///
/// Paths never carry a leading `/`. Implementations must return
/// [`StorageError::DatasetNotFound`] / [`StorageError::GroupNotFound`] for
/// missing nodes so callers can tell absence from backend failure.
pub trait CatalogueSource: Send + Sync {
    /// Short description used in log messages (usually the file path).
    fn describe(&self) -> String;

    /// Returns true if a group exists at `path`.
    fn has_group(&self, path: &str) -> bool;

    /// Returns true if a dataset exists at `path`.
    fn has_dataset(&self, path: &str) -> bool;

    /// Names (not full paths) of the datasets directly inside `group`, sorted.
    fn list_datasets(&self, group: &str) -> Result<Vec<String>, StorageError>;

    /// Numeric scalar attributes attached to `group`.
    fn attributes(&self, group: &str) -> Result<BTreeMap<String, AttributeValue>, StorageError>;

    /// Shape of the dataset at `path`.
    fn dataset_shape(&self, path: &str) -> Result<DatasetShape, StorageError>;

    /// Reads the whole dataset at `path`.
    fn read_column(&self, path: &str) -> Result<Column, StorageError>;

    /// Reads selected rows of the dataset at `path`, in the order given.
    ///
    /// The default reads the whole dataset and gathers the rows.
    fn read_rows(&self, path: &str, rows: &[usize]) -> Result<Column, StorageError> {
        self.read_column(path)?.select(rows)
    }
}

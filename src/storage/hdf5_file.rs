//! HDF5 file backend.
//!
//! Opens a catalogue file read-only and maps its groups, numeric
//! attributes and datasets onto [`CatalogueSource`]. Integer datasets are
//! widened to `i64`, float datasets to `f64`; datasets with more than one
//! component per row become [`Column::FloatVector`] (an `[N, 1]` dataset
//! reads as a plain column). Anything else, including from
//! [`CatalogueSource::dataset_shape`], is reported as
//! [`StorageError::UnsupportedType`].
//!
//! The file handle is owned by [`Hdf5Catalogue`] and released when it is
//! dropped or explicitly closed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hdf5::types::TypeDescriptor;

use crate::column::{AttributeValue, Column};
use crate::storage::traits::{CatalogueSource, DatasetShape, StorageError};

#[allow(clippy::needless_pass_by_value)]
fn backend(e: hdf5::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

#[derive(Debug, Clone, Copy)]
enum ElementKind {
    Int,
    Float,
}

fn element_kind(path: &str, dtype: &hdf5::Datatype) -> Result<ElementKind, StorageError> {
    match dtype.to_descriptor().map_err(backend)? {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => Ok(ElementKind::Int),
        TypeDescriptor::Float(_) => Ok(ElementKind::Float),
        other => Err(StorageError::UnsupportedType {
            path: path.to_string(),
            dtype: format!("{other:?}"),
        }),
    }
}

fn shape_of(dims: &[usize]) -> DatasetShape {
    match dims {
        [] => DatasetShape { rows: 1, width: 1 },
        [rows] => DatasetShape {
            rows: *rows,
            width: 1,
        },
        [rows, rest @ ..] => DatasetShape {
            rows: *rows,
            width: rest.iter().product(),
        },
    }
}

/// Catalogue backed by an HDF5 file opened read-only.
pub struct Hdf5Catalogue {
    file: hdf5::File,
    path: PathBuf,
}

impl std::fmt::Debug for Hdf5Catalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hdf5Catalogue")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Hdf5Catalogue {
    /// Opens `path` read-only.
    ///
    /// # Errors
    /// - [`StorageError::Io`] with `NotFound` if the path does not exist
    /// - [`StorageError::Backend`] if the file is not a readable HDF5 file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a file", path.display()),
            )));
        }
        let file = hdf5::File::open(path).map_err(backend)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path the catalogue was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the underlying file handle.
    pub fn close(self) -> Result<(), StorageError> {
        self.file.close().map_err(backend)
    }

    fn dataset(&self, path: &str) -> Result<hdf5::Dataset, StorageError> {
        let path = normalize_path(path);
        if !self.has_dataset(path) {
            return Err(StorageError::DatasetNotFound(path.to_string()));
        }
        self.file.dataset(path).map_err(backend)
    }

    fn group(&self, path: &str) -> Result<hdf5::Group, StorageError> {
        let path = normalize_path(path);
        if path.is_empty() {
            return self.file.group("/").map_err(backend);
        }
        if !self.has_group(path) {
            return Err(StorageError::GroupNotFound(path.to_string()));
        }
        self.file.group(path).map_err(backend)
    }
}

impl CatalogueSource for Hdf5Catalogue {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn has_group(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.file.link_exists(path) && self.file.group(path).is_ok()
    }

    fn has_dataset(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.file.link_exists(path) && self.file.dataset(path).is_ok()
    }

    fn list_datasets(&self, group: &str) -> Result<Vec<String>, StorageError> {
        let group = self.group(group)?;
        let mut names: Vec<String> = group
            .member_names()
            .map_err(backend)?
            .into_iter()
            .filter(|name| group.dataset(name).is_ok())
            .collect();
        names.sort();
        Ok(names)
    }

    fn attributes(&self, group: &str) -> Result<BTreeMap<String, AttributeValue>, StorageError> {
        let location = self.group(group)?;
        let mut out = BTreeMap::new();
        for name in location.attr_names().map_err(backend)? {
            let attr = location.attr(&name).map_err(backend)?;
            let dtype = attr.dtype().map_err(backend)?;
            let value = match element_kind(&name, &dtype) {
                Ok(ElementKind::Int) => attr
                    .read_raw::<i64>()
                    .map_err(backend)?
                    .first()
                    .copied()
                    .map(AttributeValue::Int),
                Ok(ElementKind::Float) => attr
                    .read_raw::<f64>()
                    .map_err(backend)?
                    .first()
                    .copied()
                    .map(AttributeValue::Float),
                Err(_) => None,
            };
            match value {
                Some(v) if attr.size() == 1 => {
                    out.insert(name, v);
                }
                _ => tracing::warn!(
                    group,
                    attribute = %name,
                    "Skipping non-scalar or non-numeric header attribute"
                ),
            }
        }
        Ok(out)
    }

    fn dataset_shape(&self, path: &str) -> Result<DatasetShape, StorageError> {
        let dataset = self.dataset(path)?;
        element_kind(path, &dataset.dtype().map_err(backend)?)?;
        Ok(shape_of(&dataset.shape()))
    }

    fn read_column(&self, path: &str) -> Result<Column, StorageError> {
        let dataset = self.dataset(path)?;
        let shape = shape_of(&dataset.shape());
        let dtype = dataset.dtype().map_err(backend)?;
        let kind = element_kind(path, &dtype)?;

        if shape.width > 1 {
            let values = dataset.read_raw::<f64>().map_err(backend)?;
            return Column::float_vector(shape.width, values);
        }
        match kind {
            ElementKind::Int => Ok(Column::Int(dataset.read_raw::<i64>().map_err(backend)?)),
            ElementKind::Float => Ok(Column::Float(dataset.read_raw::<f64>().map_err(backend)?)),
        }
    }
}

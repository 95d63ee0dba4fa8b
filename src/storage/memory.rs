//! In-memory catalogue backend.
//!
//! [`MemoryCatalogue`] keeps every group, attribute and dataset in maps.
//! Used for tests and small synthetic catalogues, and as the reference
//! implementation of the trait contract. Catalogues can be assembled with
//! the builder methods or loaded from a JSON dump.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::column::{AttributeValue, Column};
use crate::storage::traits::{CatalogueSource, DatasetShape, StorageError};

fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// Every proper prefix of `path` (`a/b/c` yields `a` and `a/b`).
fn parent_groups(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

/// Serialized form of a [`MemoryCatalogue`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueDump {
    /// Attributes keyed by group path, then attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, BTreeMap<String, AttributeValue>>,
    /// Datasets keyed by full path.
    #[serde(default)]
    pub datasets: BTreeMap<String, Column>,
}

/// Catalogue held entirely in memory.
///
/// # Examples
///
/// ```
/// use eagle_db::{Column, CatalogueSource, MemoryCatalogue};
///
/// let catalogue = MemoryCatalogue::new()
///     .with_attribute("Header", "HubbleParam", 0.6777)
///     .with_dataset("Subhalo/Mass", Column::Float(vec![1.0e10, 2.0e10]));
///
/// assert!(catalogue.has_group("Subhalo"));
/// assert_eq!(catalogue.list_datasets("Subhalo").unwrap(), vec!["Mass".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogue {
    groups: BTreeSet<String>,
    attributes: BTreeMap<String, BTreeMap<String, AttributeValue>>,
    datasets: BTreeMap<String, Column>,
}

impl MemoryCatalogue {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a group attribute, creating the group if needed.
    #[must_use]
    pub fn with_attribute(
        mut self,
        group: &str,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.insert_attribute(group, name, value);
        self
    }

    /// Adds (or replaces) a dataset, creating its parent groups.
    #[must_use]
    pub fn with_dataset(mut self, path: &str, column: Column) -> Self {
        self.insert_dataset(path, column);
        self
    }

    /// Creates an empty group.
    #[must_use]
    pub fn with_group(mut self, group: &str) -> Self {
        self.register_group(normalize_path(group));
        self
    }

    /// Sets a group attribute in place.
    pub fn insert_attribute(&mut self, group: &str, name: &str, value: impl Into<AttributeValue>) {
        let group = normalize_path(group);
        self.register_group(group);
        self.attributes
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), value.into());
    }

    /// Inserts a dataset in place, creating its parent groups.
    pub fn insert_dataset(&mut self, path: &str, column: Column) {
        let path = normalize_path(path);
        for parent in parent_groups(path) {
            self.groups.insert(parent.to_string());
        }
        self.datasets.insert(path.to_string(), column);
    }

    /// Removes a dataset, returning it if present.
    pub fn remove_dataset(&mut self, path: &str) -> Option<Column> {
        self.datasets.remove(normalize_path(path))
    }

    fn register_group(&mut self, group: &str) {
        for parent in parent_groups(group) {
            self.groups.insert(parent.to_string());
        }
        self.groups.insert(group.to_string());
    }

    /// Builds a catalogue from its serialized form.
    #[must_use]
    pub fn from_dump(dump: CatalogueDump) -> Self {
        let mut catalogue = Self::new();
        for (group, attrs) in dump.attributes {
            for (name, value) in attrs {
                catalogue.insert_attribute(&group, &name, value);
            }
        }
        for (path, column) in dump.datasets {
            catalogue.insert_dataset(&path, column);
        }
        catalogue
    }

    /// Serialized form of this catalogue.
    #[must_use]
    pub fn to_dump(&self) -> CatalogueDump {
        CatalogueDump {
            attributes: self.attributes.clone(),
            datasets: self.datasets.clone(),
        }
    }

    /// Parses a JSON dump.
    pub fn from_json_str(json: &str) -> Result<Self, StorageError> {
        let dump: CatalogueDump =
            serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self::from_dump(dump))
    }

    /// Reads a JSON dump from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Serializes this catalogue to JSON.
    pub fn to_json_string(&self) -> Result<String, StorageError> {
        serde_json::to_string(&self.to_dump()).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

impl CatalogueSource for MemoryCatalogue {
    fn describe(&self) -> String {
        format!("<memory: {} datasets>", self.datasets.len())
    }

    fn has_group(&self, path: &str) -> bool {
        self.groups.contains(normalize_path(path))
    }

    fn has_dataset(&self, path: &str) -> bool {
        self.datasets.contains_key(normalize_path(path))
    }

    fn list_datasets(&self, group: &str) -> Result<Vec<String>, StorageError> {
        let group = normalize_path(group);
        if !self.groups.contains(group) {
            return Err(StorageError::GroupNotFound(group.to_string()));
        }
        let prefix = format!("{group}/");
        Ok(self
            .datasets
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|name| !name.contains('/'))
            .map(str::to_string)
            .collect())
    }

    fn attributes(&self, group: &str) -> Result<BTreeMap<String, AttributeValue>, StorageError> {
        let group = normalize_path(group);
        if !self.groups.contains(group) {
            return Err(StorageError::GroupNotFound(group.to_string()));
        }
        Ok(self.attributes.get(group).cloned().unwrap_or_default())
    }

    fn dataset_shape(&self, path: &str) -> Result<DatasetShape, StorageError> {
        let column = self.lookup(path)?;
        Ok(DatasetShape {
            rows: column.len(),
            width: column.width(),
        })
    }

    fn read_column(&self, path: &str) -> Result<Column, StorageError> {
        self.lookup(path).cloned()
    }

    fn read_rows(&self, path: &str, rows: &[usize]) -> Result<Column, StorageError> {
        self.lookup(path)?.select(rows)
    }
}

impl MemoryCatalogue {
    /// Dataset at `path`. Vector datasets inserted through the builders are
    /// checked for whole rows here.
    fn lookup(&self, path: &str) -> Result<&Column, StorageError> {
        let path = normalize_path(path);
        let column = self
            .datasets
            .get(path)
            .ok_or_else(|| StorageError::DatasetNotFound(path.to_string()))?;
        column
            .validate()
            .map_err(|e| StorageError::Backend(format!("dataset '{path}': {e}")))?;
        Ok(column)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small EAGLE-like catalogues shared by unit tests.

    use super::MemoryCatalogue;
    use crate::column::Column;

    /// Four snapshots, two independent main branches and one merger.
    ///
    /// Rows (catalogue order), depth-first ids:
    ///
    /// | row | snap | GalaxyID | TopLeafID | DescendantID | Mass |
    /// |-----|------|----------|-----------|--------------|------|
    /// | 0   | 3    | 0        | 3         | -1           | 40   |
    /// | 1   | 2    | 1        | 3         | 0            | 30   |
    /// | 2   | 1    | 2        | 3         | 1            | 20   |
    /// | 3   | 0    | 3        | 3         | 2            | 10   |
    /// | 4   | 1    | 4        | 4         | 1            | 5    |   merges into galaxy 1
    /// | 5   | 3    | 10       | 12        | -1           | 400  |
    /// | 6   | 2    | 11       | 12        | 10           | 300  |
    /// | 7   | 1    | 12       | 12        | 11           | 200  |
    pub(crate) fn four_snapshot_catalogue() -> MemoryCatalogue {
        MemoryCatalogue::new()
            .with_attribute("Header", "HubbleParam", 0.6777)
            .with_attribute("Header", "Omega0", 0.307)
            .with_attribute("Header", "OmegaLambda", 0.693)
            .with_attribute("Header", "OmegaBaryon", 0.04825)
            .with_attribute("Header", "NumFilesPerSnapshot", 16_i64)
            .with_dataset("Snapshots/SnapNum", Column::Int(vec![0, 1, 2, 3]))
            .with_dataset("Snapshots/Redshift", Column::Float(vec![3.0, 2.0, 1.0, 0.0]))
            .with_dataset("Subhalo/SnapNum", Column::Int(vec![3, 2, 1, 0, 1, 3, 2, 1]))
            .with_dataset(
                "Subhalo/Mass",
                Column::Float(vec![40.0, 30.0, 20.0, 10.0, 5.0, 400.0, 300.0, 200.0]),
            )
            .with_dataset("Subhalo/SubGroupNumber", Column::Int(vec![0, 0, 0, 0, 1, 1, 1, 1]))
            .with_dataset(
                "Subhalo/CentreOfPotential",
                Column::FloatVector {
                    width: 3,
                    values: (0..24).map(f64::from).collect(),
                },
            )
            .with_dataset("MergerTree/GalaxyID", Column::Int(vec![0, 1, 2, 3, 4, 10, 11, 12]))
            .with_dataset("MergerTree/TopLeafID", Column::Int(vec![3, 3, 3, 3, 4, 12, 12, 12]))
            .with_dataset(
                "MergerTree/DescendantID",
                Column::Int(vec![-1, 0, 1, 2, 1, -1, 10, 11]),
            )
    }
}

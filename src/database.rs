//! The database: metadata, property catalogue and subgroup factory.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[cfg(feature = "hdf5")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::config::DatabaseConfig;
use crate::error::{DatabaseError, DatabaseResult};
use crate::metadata::SimulationMetadata;
use crate::storage::{CatalogueSource, StorageError};
use crate::subgroup::Subgroup;
use crate::tracking::MergerTree;

fn lock_err(context: &'static str) -> DatabaseError {
    StorageError::Backend(format!("poisoned lock: {context}")).into()
}

/// A per-subhalo dataset that can be followed along a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Name used with [`Subgroup::get`].
    pub name: String,
    /// Full dataset path.
    pub path: String,
    /// Components per subhalo (1 for scalars).
    pub width: usize,
}

impl PropertyDescriptor {
    /// Returns true if the property holds one value per subhalo.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.width == 1
    }
}

/// An open subhalo catalogue.
///
/// Owns the catalogue source (for files, the open handle) together with
/// the simulation metadata and the merger-tree indices needed for
/// tracking. Subgroups borrow the database, so they cannot outlive it.
///
/// # Example
/// ```rust,ignore
/// use eagle_db::{Database, TimeCoordinate};
///
/// let db = Database::open("RefL0100N1504_Subhalo.hdf5")?;
/// let halo = db.track_object(0, 28)?;
/// let mass = halo.get("Mass")?;
/// let z = halo.get_time_coordinate(TimeCoordinate::Redshift)?;
/// assert_eq!(mass.len(), z.len());
/// ```
pub struct Database {
    source: Box<dyn CatalogueSource>,
    config: DatabaseConfig,
    metadata: SimulationMetadata,
    tree: MergerTree,
    properties: BTreeMap<String, PropertyDescriptor>,
    cache: RwLock<HashMap<String, Arc<Column>>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("source", &self.source.describe())
            .field("snapshots", &self.metadata.snapshot_count())
            .field("subgroups", &self.tree.len())
            .field("properties", &self.properties.len())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Opens an HDF5 catalogue with the default configuration.
    ///
    /// # Errors
    /// - [`DatabaseError::FileAccess`] if the path does not exist or is not
    ///   a readable HDF5 file
    /// - [`DatabaseError::Schema`] if required groups or datasets are absent
    #[cfg(feature = "hdf5")]
    pub fn open(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        Self::open_with_config(path, DatabaseConfig::default())
    }

    /// Opens an HDF5 catalogue.
    #[cfg(feature = "hdf5")]
    pub fn open_with_config(path: impl AsRef<Path>, config: DatabaseConfig) -> DatabaseResult<Self> {
        let path = path.as_ref();
        let source = crate::storage::Hdf5Catalogue::open(path)
            .map_err(|e| DatabaseError::file_access(path, e.to_string()))?;
        Self::from_source(source, config)
    }

    /// Builds a database over any catalogue source.
    ///
    /// Loads the metadata and merger-tree linkage eagerly and validates
    /// them against each other.
    pub fn from_source(
        source: impl CatalogueSource + 'static,
        config: DatabaseConfig,
    ) -> DatabaseResult<Self> {
        let config = config.validate()?;
        let source: Box<dyn CatalogueSource> = Box::new(source);
        let layout = &config.layout;

        let metadata = SimulationMetadata::load(source.as_ref(), layout)?;
        let tree = MergerTree::load(source.as_ref(), layout)?;

        if let Some(orphan) = tree
            .snapshot_index()
            .snapshots()
            .find(|&snap| metadata.snapshot(snap).is_none())
        {
            return Err(DatabaseError::schema(format!(
                "catalogue has subgroups in snapshot {orphan}, which has no entry in '{}'",
                layout.snapshots
            )));
        }

        let properties = Self::load_properties(source.as_ref(), &config, tree.len())?;

        tracing::info!(
            source = %source.describe(),
            snapshots = metadata.snapshot_count(),
            subgroups = tree.len(),
            properties = properties.len(),
            "Opened subhalo database"
        );

        Ok(Self {
            source,
            config,
            metadata,
            tree,
            properties,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn load_properties(
        source: &dyn CatalogueSource,
        config: &DatabaseConfig,
        rows: usize,
    ) -> DatabaseResult<BTreeMap<String, PropertyDescriptor>> {
        let mut out = BTreeMap::new();
        for name in source.list_datasets(&config.layout.subhalo)? {
            let path = config.layout.subhalo_dataset(&name);
            let shape = match source.dataset_shape(&path) {
                Ok(shape) => shape,
                Err(StorageError::UnsupportedType { .. }) => {
                    tracing::warn!(%path, "Skipping dataset with unsupported element type");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if shape.rows != rows {
                tracing::warn!(
                    %path,
                    rows = shape.rows,
                    expected = rows,
                    "Skipping dataset that does not have one row per subhalo"
                );
                continue;
            }
            out.insert(
                name.clone(),
                PropertyDescriptor {
                    name,
                    path,
                    width: shape.width,
                },
            );
        }
        Ok(out)
    }

    /// Simulation metadata.
    #[must_use]
    pub const fn metadata(&self) -> &SimulationMetadata {
        &self.metadata
    }

    /// Configuration the database was opened with.
    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Merger-tree linkage of every catalogue row.
    #[must_use]
    pub const fn merger_tree(&self) -> &MergerTree {
        &self.tree
    }

    /// Number of snapshots in the snapshot table.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.metadata.snapshot_count()
    }

    /// Number of subgroups in `snapshot`.
    #[must_use]
    pub fn subgroup_count(&self, snapshot: u32) -> usize {
        self.tree.snapshot_index().count(snapshot)
    }

    /// Names of the properties that can be tracked, sorted.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Looks up a property by name.
    ///
    /// Names are resolved inside the subhalo group. A name containing `/`
    /// is taken as a full dataset path, which must hold one row per
    /// subhalo (e.g. `MergerTree/DescendantID`).
    pub fn property(&self, name: &str) -> DatabaseResult<PropertyDescriptor> {
        if let Some(found) = self.properties.get(name) {
            return Ok(found.clone());
        }
        if name.contains('/') {
            let path = name.trim_matches('/');
            if self.source.has_dataset(path) {
                let shape = match self.source.dataset_shape(path) {
                    Ok(shape) => Some(shape),
                    Err(StorageError::UnsupportedType { .. }) => None,
                    Err(e) => return Err(e.into()),
                };
                if let Some(shape) = shape.filter(|s| s.rows == self.tree.len()) {
                    return Ok(PropertyDescriptor {
                        name: path.to_string(),
                        path: path.to_string(),
                        width: shape.width,
                    });
                }
            }
        }
        Err(DatabaseError::PropertyNotFound {
            name: name.to_string(),
        })
    }

    /// Reads a whole dataset by path, caching it if configured to.
    pub fn dataset(&self, path: &str) -> DatabaseResult<Arc<Column>> {
        let path = path.trim_matches('/');
        if let Some(hit) = self
            .cache
            .read()
            .map_err(|_| lock_err("column cache"))?
            .get(path)
        {
            return Ok(Arc::clone(hit));
        }
        if !self.source.has_dataset(path) {
            return Err(DatabaseError::DatasetNotFound {
                path: path.to_string(),
            });
        }
        let column = Arc::new(self.source.read_column(path)?);
        if self.config.cache_columns {
            tracing::debug!(path, rows = column.len(), "Cached dataset");
            self.cache
                .write()
                .map_err(|_| lock_err("column cache"))?
                .insert(path.to_string(), Arc::clone(&column));
        }
        Ok(column)
    }

    /// Number of datasets currently held in the cache.
    pub fn cached_datasets(&self) -> DatabaseResult<usize> {
        Ok(self.cache.read().map_err(|_| lock_err("column cache"))?.len())
    }

    /// Reads `rows` of a property, in order.
    pub(crate) fn read_property_rows(
        &self,
        property: &PropertyDescriptor,
        rows: &[usize],
    ) -> DatabaseResult<Column> {
        if self.config.cache_columns {
            Ok(self.dataset(&property.path)?.select(rows)?)
        } else {
            Ok(self.source.read_rows(&property.path, rows)?)
        }
    }

    /// Starts tracking the `subgroup_number`-th subgroup of `snapshot`.
    ///
    /// The chain is resolved immediately using the configured tracking
    /// policy.
    ///
    /// # Errors
    /// [`DatabaseError::NotFound`] if the snapshot has no such subgroup.
    pub fn track_object(&self, subgroup_number: usize, snapshot: u32) -> DatabaseResult<Subgroup<'_>> {
        let not_found = || DatabaseError::NotFound {
            subgroup_number,
            snapshot,
        };
        let row = self.tree.row_of(subgroup_number, snapshot).ok_or_else(not_found)?;
        let chain = self
            .tree
            .resolve(row, self.config.tracking, self.metadata.snapshot_count())
            .ok_or_else(not_found)?;

        tracing::debug!(
            subgroup_number,
            snapshot,
            row,
            direction = ?self.config.tracking.direction,
            length = chain.len(),
            first_snapshot = ?chain.links().first().map(|l| l.snapshot),
            last_snapshot = ?chain.links().last().map(|l| l.snapshot),
            "Resolved subgroup chain"
        );

        Ok(Subgroup::new(self, chain))
    }

    /// Releases the catalogue source (closing the file for HDF5 catalogues).
    ///
    /// Dropping the database has the same effect.
    pub fn close(self) {
        tracing::info!(source = %self.source.describe(), "Closed subhalo database");
    }
}

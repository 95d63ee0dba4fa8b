//! # eagle-db - Subhalo catalogues and merger-tree tracking
//!
//! Reads a single-file, EAGLE-like Subfind catalogue (cosmology header,
//! per-snapshot times, per-subhalo properties and a depth-first merger
//! tree) and follows individual subhaloes across snapshots.
//!
//! ## Core Concepts
//!
//! - **Database**: an open catalogue together with its metadata and tree indices
//! - **Subgroup**: one object, located by `(subgroup_number, snapshot)` and
//!   resolved into a chain of identities at other snapshots
//! - **Chain**: the per-snapshot identities of a tracked object, ordered in time
//! - **TimeCoordinate**: redshift, expansion factor or age of the universe
//!
//! ## Usage
//!
//! ```rust,ignore
//! use eagle_db::{Database, TimeCoordinate};
//!
//! let db = Database::open("RefL0025N0376_Subhalo.hdf5")?;
//! let halo = db.track_object(0, 28)?;
//!
//! let mass = halo.get("Mass")?;
//! let z = halo.get_time_coordinate(TimeCoordinate::Redshift)?;
//! halo.plot_evolution(TimeCoordinate::UniverseAge, "Mass", "mass.svg")?;
//! ```
//!
//! ## Features
//!
//! - `hdf5`: HDF5 file backend and [`Database::open`]
//! - `plot` (default): SVG output via [`Subgroup::plot_evolution`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod column;
pub mod config;
pub mod database;
pub mod error;
pub mod index;
pub mod metadata;
pub mod series;
pub mod storage;
pub mod subgroup;
pub mod tracking;

#[cfg(feature = "plot")]
pub mod plot;

pub use column::{AttributeValue, Column, PropertyValue};
pub use config::{DatabaseConfig, PlotOptions, SchemaLayout, TrackingConfig, TrackingDirection};
pub use database::{Database, PropertyDescriptor};
pub use error::{DatabaseError, DatabaseResult};
pub use metadata::{Cosmology, SimulationMetadata, SnapshotInfo, TimeCoordinate};
pub use series::{EvolutionSeries, PropertySeries};
pub use storage::{CatalogueDump, CatalogueSource, DatasetShape, MemoryCatalogue, StorageError};
pub use subgroup::Subgroup;
pub use tracking::{Chain, ChainLink, MergerTree};

#[cfg(feature = "hdf5")]
pub use storage::Hdf5Catalogue;

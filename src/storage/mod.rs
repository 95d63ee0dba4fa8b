//! Catalogue storage backends.
//!
//! [`CatalogueSource`] is the read-only interface the database is built
//! on. Two implementations are provided: [`MemoryCatalogue`] and, with
//! the `hdf5` feature, [`Hdf5Catalogue`].

mod memory;
mod traits;

#[cfg(feature = "hdf5")]
mod hdf5_file;

pub use memory::{CatalogueDump, MemoryCatalogue};
pub use traits::{CatalogueSource, DatasetShape, StorageError};

#[cfg(feature = "hdf5")]
pub use hdf5_file::Hdf5Catalogue;

#[cfg(test)]
pub(crate) use memory::fixtures;

//! A subgroup followed across snapshots.

#[cfg(feature = "plot")]
use std::path::Path;

#[cfg(feature = "plot")]
use crate::config::PlotOptions;
use crate::database::Database;
use crate::error::{DatabaseError, DatabaseResult};
use crate::metadata::TimeCoordinate;
use crate::series::{EvolutionSeries, PropertySeries};
use crate::tracking::{Chain, ChainLink};

/// One simulated object followed through the merger tree.
///
/// Created by [`Database::track_object`]; the chain is resolved at
/// creation and never changes afterwards. Property values are read from
/// the database on demand.
#[derive(Debug)]
pub struct Subgroup<'db> {
    db: &'db Database,
    chain: Chain,
}

impl<'db> Subgroup<'db> {
    pub(crate) const fn new(db: &'db Database, chain: Chain) -> Self {
        Self { db, chain }
    }

    /// The database this subgroup reads from.
    #[must_use]
    pub const fn database(&self) -> &'db Database {
        self.db
    }

    /// Resolved identities, ordered by increasing snapshot.
    #[must_use]
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The `(subgroup_number, snapshot)` link tracking started from.
    #[must_use]
    pub fn origin(&self) -> &ChainLink {
        self.chain.origin()
    }

    /// Position of the origin among the subgroups of its snapshot.
    #[must_use]
    pub fn subgroup_number(&self) -> usize {
        self.origin().subgroup_number
    }

    /// Snapshot tracking started from.
    #[must_use]
    pub fn snapshot(&self) -> u32 {
        self.origin().snapshot
    }

    /// Catalogue row of the origin.
    #[must_use]
    pub fn positional_index(&self) -> usize {
        self.origin().row
    }

    /// Depth-first id of the origin.
    #[must_use]
    pub fn galaxy_id(&self) -> i64 {
        self.origin().galaxy_id
    }

    /// Id of the earliest main progenitor recorded for the origin.
    #[must_use]
    pub fn top_leaf_id(&self) -> Option<i64> {
        self.db.merger_tree().top_leaf_id(self.positional_index())
    }

    /// `snap * 1e12 + file * 1e8 + index_in_file`, when the catalogue has it.
    #[must_use]
    pub fn node_index(&self) -> Option<i64> {
        self.db.merger_tree().node_index(self.positional_index())
    }

    /// Main progenitors of the origin, earliest first.
    #[must_use]
    pub fn main_progenitors(&self) -> &[ChainLink] {
        self.chain.progenitors()
    }

    /// Descendants of the origin, earliest first.
    #[must_use]
    pub fn descendants(&self) -> &[ChainLink] {
        self.chain.descendants()
    }

    /// Snapshots the object was located in.
    #[must_use]
    pub fn snapshots(&self) -> Vec<u32> {
        self.chain.snapshots()
    }

    /// Values of `property_name` along the chain, in chain order.
    ///
    /// # Errors
    /// [`DatabaseError::PropertyNotFound`] if the catalogue has no such
    /// property.
    pub fn get(&self, property_name: &str) -> DatabaseResult<PropertySeries> {
        let property = self.db.property(property_name)?;
        let values = self.db.read_property_rows(&property, &self.chain.rows())?;
        Ok(PropertySeries {
            name: property.name,
            snapshots: self.chain.snapshots(),
            values,
        })
    }

    /// Time coordinate of every snapshot in the chain.
    pub fn get_time_coordinate(&self, kind: TimeCoordinate) -> DatabaseResult<Vec<f64>> {
        let metadata = self.db.metadata();
        self.chain
            .iter()
            .map(|link| {
                metadata
                    .time_coordinate(link.snapshot, kind)
                    .ok_or_else(|| {
                        DatabaseError::schema(format!(
                            "snapshot {} has no time coordinates",
                            link.snapshot
                        ))
                    })
            })
            .collect()
    }

    /// `(time, value)` pairs of a scalar property along the chain.
    ///
    /// # Errors
    /// - [`DatabaseError::PropertyNotFound`] for unknown properties
    /// - [`DatabaseError::NotScalar`] for vector-valued properties
    pub fn evolution(&self, time: TimeCoordinate, property_name: &str) -> DatabaseResult<EvolutionSeries> {
        let series = self.get(property_name)?;
        let values = series.to_f64().ok_or_else(|| DatabaseError::NotScalar {
            property: series.name.clone(),
            width: series.values.width(),
        })?;
        let times = self.get_time_coordinate(time)?;
        Ok(EvolutionSeries {
            time,
            property: series.name,
            snapshots: series.snapshots,
            points: times.into_iter().zip(values).collect(),
        })
    }

    /// Writes an SVG plot of `property_name` against `time` to `output`.
    #[cfg(feature = "plot")]
    pub fn plot_evolution(
        &self,
        time: TimeCoordinate,
        property_name: &str,
        output: impl AsRef<Path>,
    ) -> DatabaseResult<()> {
        self.plot_evolution_with(time, property_name, output, &PlotOptions::default())
    }

    /// [`plot_evolution`](Self::plot_evolution) with explicit options.
    #[cfg(feature = "plot")]
    pub fn plot_evolution_with(
        &self,
        time: TimeCoordinate,
        property_name: &str,
        output: impl AsRef<Path>,
        options: &PlotOptions,
    ) -> DatabaseResult<()> {
        let mut series = self.evolution(time, property_name)?;
        if options.log_y {
            series = series.log10_values();
        }
        crate::plot::render_svg(&series, output.as_ref(), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, PropertyValue};
    use crate::config::DatabaseConfig;
    use crate::storage::fixtures;

    fn db() -> Database {
        Database::from_source(fixtures::four_snapshot_catalogue(), DatabaseConfig::default()).unwrap()
    }

    #[test]
    fn test_mass_along_main_branch() {
        let db = db();
        let halo = db.track_object(0, 3).unwrap();
        let mass = halo.get("Mass").unwrap();
        assert_eq!(mass.snapshots, vec![0, 1, 2, 3]);
        assert_eq!(mass.values, Column::Float(vec![10.0, 20.0, 30.0, 40.0]));
    }

    #[test]
    fn test_identity_accessors() {
        let db = db();
        let halo = db.track_object(0, 3).unwrap();
        assert_eq!(halo.subgroup_number(), 0);
        assert_eq!(halo.snapshot(), 3);
        assert_eq!(halo.positional_index(), 0);
        assert_eq!(halo.galaxy_id(), 0);
        assert_eq!(halo.top_leaf_id(), Some(3));
        assert_eq!(halo.node_index(), None);
        assert_eq!(halo.main_progenitors().len(), 3);
        assert!(halo.descendants().is_empty());
    }

    #[test]
    fn test_vector_property() {
        let db = db();
        let halo = db.track_object(1, 3).unwrap();
        let cop = halo.get("CentreOfPotential").unwrap();
        assert_eq!(cop.len(), 3);
        // rows 7, 6, 5
        assert_eq!(
            cop.get(0).unwrap().1,
            PropertyValue::Vector(vec![21.0, 22.0, 23.0])
        );
        assert_eq!(
            cop.at_snapshot(3),
            Some(PropertyValue::Vector(vec![15.0, 16.0, 17.0]))
        );
    }

    #[test]
    fn test_unknown_property() {
        let db = db();
        let halo = db.track_object(0, 3).unwrap();
        assert!(halo.get("StarFormationRate").unwrap_err().is_property_not_found());
    }

    #[test]
    fn test_time_coordinates_follow_metadata() {
        let db = db();
        let halo = db.track_object(1, 3).unwrap();
        let z = halo.get_time_coordinate(TimeCoordinate::Redshift).unwrap();
        assert_eq!(z, vec![2.0, 1.0, 0.0]);
        let a = halo.get_time_coordinate(TimeCoordinate::ExpansionFactor).unwrap();
        assert!((a[2] - 1.0).abs() < 1e-12);
        let age = halo.get_time_coordinate(TimeCoordinate::UniverseAge).unwrap();
        assert!(age.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_evolution_pairs_time_and_value() {
        let db = db();
        let halo = db.track_object(0, 3).unwrap();
        let evo = halo.evolution(TimeCoordinate::Redshift, "Mass").unwrap();
        assert_eq!(evo.points, vec![(3.0, 10.0), (2.0, 20.0), (1.0, 30.0), (0.0, 40.0)]);
        assert_eq!(evo.property, "Mass");
    }

    #[test]
    fn test_evolution_of_integer_property() {
        let db = db();
        let halo = db.track_object(0, 3).unwrap();
        let evo = halo.evolution(TimeCoordinate::Redshift, "SnapNum").unwrap();
        assert_eq!(evo.ys(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_evolution_rejects_vector_property() {
        let db = db();
        let halo = db.track_object(0, 3).unwrap();
        let err = halo
            .evolution(TimeCoordinate::Redshift, "CentreOfPotential")
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotScalar { width: 3, .. }));
    }

    #[test]
    fn test_single_component_vector_evolves_as_scalar() {
        let cat = fixtures::four_snapshot_catalogue().with_dataset(
            "Subhalo/StarFormationRate",
            Column::FloatVector {
                width: 1,
                values: vec![4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            },
        );
        let db = Database::from_source(cat, DatabaseConfig::default()).unwrap();
        assert!(db.property("StarFormationRate").unwrap().is_scalar());
        let halo = db.track_object(0, 3).unwrap();
        let evo = halo
            .evolution(TimeCoordinate::Redshift, "StarFormationRate")
            .unwrap();
        assert_eq!(evo.ys(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_uncached_reads_match_cached() {
        let cached = db();
        let uncached = Database::from_source(
            fixtures::four_snapshot_catalogue(),
            DatabaseConfig::default().with_cache_columns(false),
        )
        .unwrap();
        let a = cached.track_object(1, 1).unwrap().get("Mass").unwrap();
        let b = uncached.track_object(1, 1).unwrap().get("Mass").unwrap();
        assert_eq!(a, b);
        assert_eq!(uncached.cached_datasets().unwrap(), 0);
    }

    #[test]
    fn test_full_path_property() {
        let db = db();
        let halo = db.track_object(0, 3).unwrap();
        let ids = halo.get("MergerTree/GalaxyID").unwrap();
        assert_eq!(ids.values, Column::Int(vec![3, 2, 1, 0]));
    }
}

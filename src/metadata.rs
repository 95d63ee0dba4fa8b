//! Simulation-wide metadata.
//!
//! Cosmological parameters come from the header attributes; per-snapshot
//! time coordinates come from the snapshot table. Missing expansion
//! factors are derived from redshifts (and vice versa), and a missing
//! universe age is computed for a flat ΛCDM cosmology.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::config::SchemaLayout;
use crate::error::{DatabaseError, DatabaseResult};
use crate::storage::CatalogueSource;

/// Hubble time `1/H0` in Gyr for `h = 1`.
const HUBBLE_TIME_GYR: f64 = 9.777_922_216;

/// Cosmological parameters of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    /// Dimensionless Hubble parameter `h`.
    pub hubble_param: f64,
    /// Matter density parameter.
    pub omega_matter: f64,
    /// Dark-energy density parameter.
    pub omega_lambda: f64,
    /// Baryon density parameter, when the header stores it.
    pub omega_baryon: Option<f64>,
    /// Comoving box size, in the file's units.
    pub box_size: Option<f64>,
    /// Every other numeric header attribute.
    pub extra: BTreeMap<String, f64>,
}

impl Cosmology {
    /// Age of a flat ΛCDM universe at expansion factor `a`, in Gyr.
    #[must_use]
    pub fn age_at(&self, expansion_factor: f64) -> f64 {
        let hubble_time = HUBBLE_TIME_GYR / self.hubble_param;
        if self.omega_lambda <= 0.0 {
            // Einstein-de Sitter
            return 2.0 / 3.0 * hubble_time * expansion_factor.powf(1.5);
        }
        let ratio = (self.omega_lambda / self.omega_matter).sqrt();
        2.0 / (3.0 * self.omega_lambda.sqrt())
            * hubble_time
            * (ratio * expansion_factor.powf(1.5)).asinh()
    }

    fn from_attributes(
        mut attrs: BTreeMap<String, f64>,
        group: &str,
    ) -> DatabaseResult<Self> {
        let mut required = |name: &str| {
            attrs.remove(name).ok_or_else(|| {
                DatabaseError::schema(format!("header attribute '{group}/{name}' is missing"))
            })
        };
        let hubble_param = required("HubbleParam")?;
        let omega_matter = required("Omega0")?;
        let omega_lambda = required("OmegaLambda")?;
        if hubble_param <= 0.0 {
            return Err(DatabaseError::schema(format!(
                "HubbleParam must be positive (got {hubble_param})"
            )));
        }
        Ok(Self {
            hubble_param,
            omega_matter,
            omega_lambda,
            omega_baryon: attrs.remove("OmegaBaryon"),
            box_size: attrs.remove("BoxSize"),
            extra: attrs,
        })
    }
}

/// Time coordinates of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// Snapshot number.
    pub snapshot: u32,
    /// Redshift `z`.
    pub redshift: f64,
    /// Expansion factor `a = 1 / (1 + z)`.
    pub expansion_factor: f64,
    /// Age of the universe in Gyr.
    pub universe_age: f64,
}

impl SnapshotInfo {
    /// Value of the requested time coordinate.
    #[must_use]
    pub const fn coordinate(&self, kind: TimeCoordinate) -> f64 {
        match kind {
            TimeCoordinate::Redshift => self.redshift,
            TimeCoordinate::ExpansionFactor => self.expansion_factor,
            TimeCoordinate::UniverseAge => self.universe_age,
        }
    }
}

/// The time axis a property evolution can be expressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeCoordinate {
    /// Redshift `z`.
    Redshift,
    /// Expansion factor `a`.
    ExpansionFactor,
    /// Age of the universe in Gyr.
    UniverseAge,
}

impl TimeCoordinate {
    /// All time coordinates.
    pub const ALL: [Self; 3] = [Self::Redshift, Self::ExpansionFactor, Self::UniverseAge];

    /// Axis label used in plots.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Redshift => "Redshift",
            Self::ExpansionFactor => "Expansion factor",
            Self::UniverseAge => "Universe age [Gyr]",
        }
    }
}

impl fmt::Display for TimeCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Redshift => "Redshift",
            Self::ExpansionFactor => "ExpansionFactor",
            Self::UniverseAge => "UniverseAge",
        };
        f.write_str(name)
    }
}

impl FromStr for TimeCoordinate {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "redshift" | "z" => Ok(Self::Redshift),
            "expansionfactor" | "scalefactor" | "a" => Ok(Self::ExpansionFactor),
            "universeage" | "age" | "time" | "cosmictime" => Ok(Self::UniverseAge),
            _ => Err(DatabaseError::InvalidTimeCoordinate {
                value: s.to_string(),
            }),
        }
    }
}

/// Immutable record of the simulation's cosmology and snapshot times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetadata {
    /// Cosmological parameters from the header.
    pub cosmology: Cosmology,
    /// Ordered by snapshot number.
    pub snapshots: Vec<SnapshotInfo>,
}

impl SimulationMetadata {
    /// Loads the header and snapshot table from `source`.
    pub fn load(source: &dyn CatalogueSource, layout: &SchemaLayout) -> DatabaseResult<Self> {
        if !source.has_group(&layout.header) {
            return Err(DatabaseError::schema(format!(
                "header group '{}' is missing",
                layout.header
            )));
        }
        let attrs = source
            .attributes(&layout.header)?
            .into_iter()
            .map(|(k, v)| (k, v.as_f64()))
            .collect();
        let cosmology = Cosmology::from_attributes(attrs, &layout.header)?;
        let snapshots = load_snapshots(source, layout, &cosmology)?;
        Ok(Self {
            cosmology,
            snapshots,
        })
    }

    /// Number of snapshots.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Looks up a snapshot by number.
    #[must_use]
    pub fn snapshot(&self, snapshot: u32) -> Option<&SnapshotInfo> {
        self.snapshots
            .binary_search_by_key(&snapshot, |s| s.snapshot)
            .ok()
            .and_then(|i| self.snapshots.get(i))
    }

    /// Time coordinate of a snapshot.
    #[must_use]
    pub fn time_coordinate(&self, snapshot: u32, kind: TimeCoordinate) -> Option<f64> {
        self.snapshot(snapshot).map(|s| s.coordinate(kind))
    }

    /// Highest snapshot number.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<u32> {
        self.snapshots.last().map(|s| s.snapshot)
    }
}

fn read_optional_f64(
    source: &dyn CatalogueSource,
    path: &str,
) -> DatabaseResult<Option<Vec<f64>>> {
    if !source.has_dataset(path) {
        return Ok(None);
    }
    source
        .read_column(path)?
        .to_f64()
        .map(Some)
        .ok_or_else(|| DatabaseError::schema(format!("'{path}' must be one-dimensional")))
}

fn load_snapshots(
    source: &dyn CatalogueSource,
    layout: &SchemaLayout,
    cosmology: &Cosmology,
) -> DatabaseResult<Vec<SnapshotInfo>> {
    let redshift_path = layout.snapshot_dataset("Redshift");
    let expansion_path = layout.snapshot_dataset("ExpansionFactor");
    let redshifts = read_optional_f64(source, &redshift_path)?;
    let expansions = read_optional_f64(source, &expansion_path)?;

    let (redshifts, expansions) = match (redshifts, expansions) {
        (Some(z), Some(a)) => (z, a),
        (Some(z), None) => {
            let a = z.iter().map(|z| 1.0 / (1.0 + z)).collect();
            (z, a)
        }
        (None, Some(a)) => {
            let z = a.iter().map(|a| 1.0 / a - 1.0).collect();
            (z, a)
        }
        (None, None) => {
            return Err(DatabaseError::schema(format!(
                "snapshot table needs '{redshift_path}' or '{expansion_path}'"
            )))
        }
    };
    let count = redshifts.len();
    if expansions.len() != count {
        return Err(DatabaseError::schema(format!(
            "'{redshift_path}' has {count} rows but '{expansion_path}' has {}",
            expansions.len()
        )));
    }

    let ages = read_optional_f64(source, &layout.snapshot_dataset("UniverseAge"))?
        .unwrap_or_else(|| expansions.iter().map(|&a| cosmology.age_at(a)).collect());
    if ages.len() != count {
        return Err(DatabaseError::schema(format!(
            "snapshot table has {count} redshifts but {} universe ages",
            ages.len()
        )));
    }

    let numbers_path = layout.snapshot_dataset("SnapNum");
    let numbers: Vec<u32> = if source.has_dataset(&numbers_path) {
        match source.read_column(&numbers_path)? {
            Column::Int(v) => v
                .into_iter()
                .map(|n| {
                    u32::try_from(n).map_err(|_| {
                        DatabaseError::schema(format!("invalid snapshot number {n} in '{numbers_path}'"))
                    })
                })
                .collect::<DatabaseResult<_>>()?,
            other => {
                return Err(DatabaseError::schema(format!(
                    "'{numbers_path}' must hold integers (found {})",
                    other.type_name()
                )))
            }
        }
    } else {
        (0..count)
            .map(|n| {
                u32::try_from(n).map_err(|_| DatabaseError::schema("too many snapshots"))
            })
            .collect::<DatabaseResult<_>>()?
    };
    if numbers.len() != count {
        return Err(DatabaseError::schema(format!(
            "'{numbers_path}' has {} rows, expected {count}",
            numbers.len()
        )));
    }

    let mut snapshots: Vec<SnapshotInfo> = numbers
        .into_iter()
        .zip(redshifts)
        .zip(expansions)
        .zip(ages)
        .map(|(((snapshot, redshift), expansion_factor), universe_age)| SnapshotInfo {
            snapshot,
            redshift,
            expansion_factor,
            universe_age,
        })
        .collect();
    snapshots.sort_by_key(|s| s.snapshot);
    if snapshots.windows(2).any(|w| w[0].snapshot == w[1].snapshot) {
        return Err(DatabaseError::schema(format!(
            "duplicate snapshot numbers in '{numbers_path}'"
        )));
    }
    Ok(snapshots)
}

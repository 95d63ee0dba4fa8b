//! Property time series produced by tracked subgroups.

use serde::{Deserialize, Serialize};

use crate::column::{Column, PropertyValue};
use crate::metadata::TimeCoordinate;

/// Values of one property along a chain, aligned with its snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySeries {
    /// Property name.
    pub name: String,
    /// Snapshot of each value, increasing.
    pub snapshots: Vec<u32>,
    /// One value per snapshot.
    pub values: Column,
}

impl PropertySeries {
    /// Number of snapshots in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if the series has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// `(snapshot, value)` at position `i` of the chain.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<(u32, PropertyValue)> {
        Some((*self.snapshots.get(i)?, self.values.get(i)?))
    }

    /// Value at `snapshot`, if the chain reaches it.
    #[must_use]
    pub fn at_snapshot(&self, snapshot: u32) -> Option<PropertyValue> {
        let i = self.snapshots.binary_search(&snapshot).ok()?;
        self.values.get(i)
    }

    /// `(snapshot, value)` pairs in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, PropertyValue)> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Scalar values as `f64`; `None` for vector properties.
    #[must_use]
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        self.values.to_f64()
    }
}

/// `(time, value)` pairs of a scalar property, ready to plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSeries {
    /// Time axis of the points.
    pub time: TimeCoordinate,
    /// Property name.
    pub property: String,
    /// Snapshot of each point.
    pub snapshots: Vec<u32>,
    /// `(time, value)` pairs in chain order.
    pub points: Vec<(f64, f64)>,
}

impl EvolutionSeries {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time values.
    #[must_use]
    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.0).collect()
    }

    /// Property values.
    #[must_use]
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.1).collect()
    }

    /// `((x_min, x_max), (y_min, y_max))` over finite points.
    #[must_use]
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut finite = self
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite());
        let &(x0, y0) = finite.next()?;
        Some(finite.fold(((x0, x0), (y0, y0)), |((xl, xh), (yl, yh)), &(x, y)| {
            ((xl.min(x), xh.max(x)), (yl.min(y), yh.max(y)))
        }))
    }

    /// Same series with `log10` applied to the values. Non-positive values
    /// are dropped.
    #[must_use]
    pub fn log10_values(&self) -> Self {
        let (snapshots, points) = self
            .snapshots
            .iter()
            .zip(&self.points)
            .filter(|(_, (_, y))| *y > 0.0)
            .map(|(&s, &(x, y))| (s, (x, y.log10())))
            .unzip();
        Self {
            time: self.time,
            property: format!("log10 {}", self.property),
            snapshots,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mass_series() -> PropertySeries {
        PropertySeries {
            name: "Mass".to_string(),
            snapshots: vec![0, 1, 3],
            values: Column::Float(vec![10.0, 20.0, 40.0]),
        }
    }

    #[test]
    fn test_property_series_access() {
        let s = mass_series();
        assert_eq!(s.len(), 3);
        assert_eq!(s.get(1), Some((1, PropertyValue::Float(20.0))));
        assert_eq!(s.at_snapshot(3), Some(PropertyValue::Float(40.0)));
        assert_eq!(s.at_snapshot(2), None);
        assert_eq!(s.iter().map(|(snap, _)| snap).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(s.to_f64(), Some(vec![10.0, 20.0, 40.0]));
    }

    #[test]
    fn test_bounds_skip_non_finite() {
        let e = EvolutionSeries {
            time: TimeCoordinate::Redshift,
            property: "Mass".to_string(),
            snapshots: vec![0, 1, 2],
            points: vec![(3.0, 1.0), (f64::NAN, 5.0), (0.0, 4.0)],
        };
        assert_eq!(e.bounds(), Some(((0.0, 3.0), (1.0, 4.0))));
        assert_eq!(e.xs().len(), 3);
    }

    #[test]
    fn test_bounds_empty() {
        let e = EvolutionSeries {
            time: TimeCoordinate::UniverseAge,
            property: "Mass".to_string(),
            snapshots: vec![],
            points: vec![],
        };
        assert!(e.bounds().is_none());
        assert!(e.is_empty());
    }

    #[test]
    fn test_log10_drops_non_positive() {
        let e = EvolutionSeries {
            time: TimeCoordinate::ExpansionFactor,
            property: "Mass".to_string(),
            snapshots: vec![0, 1, 2],
            points: vec![(0.25, 0.0), (0.5, 100.0), (1.0, 1000.0)],
        };
        let log = e.log10_values();
        assert_eq!(log.snapshots, vec![1, 2]);
        let ys = log.ys();
        assert!((ys[0] - 2.0).abs() < 1e-12);
        assert!((ys[1] - 3.0).abs() < 1e-12);
        assert_eq!(log.property, "log10 Mass");
    }
}

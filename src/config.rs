//! Database configuration.
//!
//! Every setting has a default matching the EAGLE database layout, so
//! `DatabaseConfig::default()` is what most callers want. Configurations
//! can also be loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, DatabaseResult};

/// Group names the catalogue is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaLayout {
    /// Group carrying the cosmology as attributes.
    pub header: String,
    /// Group with one row per snapshot (redshift, scale factor, age).
    pub snapshots: String,
    /// Group with one row per subhalo; every dataset in it is a property.
    pub subhalo: String,
    /// Group with the depth-first merger tree ids.
    pub merger_tree: String,
}

impl Default for SchemaLayout {
    fn default() -> Self {
        Self {
            header: "Header".to_string(),
            snapshots: "Snapshots".to_string(),
            subhalo: "Subhalo".to_string(),
            merger_tree: "MergerTree".to_string(),
        }
    }
}

impl SchemaLayout {
    /// `<snapshots>/<name>`
    #[must_use]
    pub fn snapshot_dataset(&self, name: &str) -> String {
        format!("{}/{name}", self.snapshots)
    }

    /// `<subhalo>/<name>`
    #[must_use]
    pub fn subhalo_dataset(&self, name: &str) -> String {
        format!("{}/{name}", self.subhalo)
    }

    /// `<merger_tree>/<name>`
    #[must_use]
    pub fn merger_tree_dataset(&self, name: &str) -> String {
        format!("{}/{name}", self.merger_tree)
    }
}

/// Which links are followed when resolving a tracked subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingDirection {
    /// Main progenitors only (earlier snapshots).
    Progenitors,
    /// Descendants only (later snapshots).
    Descendants,
    /// Both directions.
    #[default]
    Both,
}

impl TrackingDirection {
    /// Returns true if main progenitors are followed.
    #[must_use]
    pub const fn follows_progenitors(self) -> bool {
        matches!(self, Self::Progenitors | Self::Both)
    }

    /// Returns true if descendants are followed.
    #[must_use]
    pub const fn follows_descendants(self) -> bool {
        matches!(self, Self::Descendants | Self::Both)
    }
}

/// Chain resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Which links to follow.
    pub direction: TrackingDirection,
    /// Stop following descendants once the tracked subgroup is no longer
    /// the main progenitor of its descendant.
    pub stop_at_mergers: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            direction: TrackingDirection::Both,
            stop_at_mergers: true,
        }
    }
}

/// Configuration for [`Database`](crate::Database).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Chain resolution policy.
    pub tracking: TrackingConfig,
    /// Keep every dataset read through [`Database::dataset`](crate::Database::dataset)
    /// in memory for the lifetime of the database.
    pub cache_columns: bool,
    /// Group names inside the catalogue.
    pub layout: SchemaLayout,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            cache_columns: true,
            layout: SchemaLayout::default(),
        }
    }
}

impl DatabaseConfig {
    /// Rejects empty or nested group names.
    pub fn validate(self) -> DatabaseResult<Self> {
        let groups = [
            ("header", &self.layout.header),
            ("snapshots", &self.layout.snapshots),
            ("subhalo", &self.layout.subhalo),
            ("merger_tree", &self.layout.merger_tree),
        ];
        for (field, name) in groups {
            let trimmed = name.trim_matches('/');
            if trimmed.is_empty() {
                return Err(DatabaseError::InvalidConfig {
                    reason: format!("layout.{field} must not be empty"),
                });
            }
            if trimmed.contains('/') {
                return Err(DatabaseError::InvalidConfig {
                    reason: format!("layout.{field} must be a top-level group (got '{name}')"),
                });
            }
        }
        Ok(self)
    }

    /// Parses a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> DatabaseResult<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| DatabaseError::InvalidConfig {
            reason: e.to_string(),
        })?;
        cfg.validate()
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DatabaseError::file_access(path, e.to_string()))?;
        Self::from_json_str(&json)
    }

    /// Sets the tracking direction.
    #[must_use]
    pub fn with_direction(mut self, direction: TrackingDirection) -> Self {
        self.tracking.direction = direction;
        self
    }

    /// Sets whether descendant walks stop at mergers.
    #[must_use]
    pub fn with_stop_at_mergers(mut self, stop: bool) -> Self {
        self.tracking.stop_at_mergers = stop;
        self
    }

    /// Enables or disables the dataset cache.
    #[must_use]
    pub fn with_cache_columns(mut self, cache: bool) -> Self {
        self.cache_columns = cache;
        self
    }
}

/// Appearance of evolution plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Plot `log10` of the property (masses span many decades).
    pub log_y: bool,
    /// Draw a marker at every snapshot in addition to the line.
    pub markers: bool,
    /// Plot title; defaults to "<property> vs <time coordinate>".
    pub title: Option<String>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            log_y: false,
            markers: true,
            title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_paths() {
        let layout = SchemaLayout::default();
        assert_eq!(layout.subhalo_dataset("Mass"), "Subhalo/Mass");
        assert_eq!(layout.merger_tree_dataset("GalaxyID"), "MergerTree/GalaxyID");
        assert_eq!(layout.snapshot_dataset("Redshift"), "Snapshots/Redshift");
    }

    #[test]
    fn test_default_tracking_follows_both() {
        let cfg = DatabaseConfig::default();
        assert!(cfg.tracking.direction.follows_progenitors());
        assert!(cfg.tracking.direction.follows_descendants());
        assert!(cfg.tracking.stop_at_mergers);
        assert!(cfg.cache_columns);
    }

    #[test]
    fn test_direction_predicates() {
        assert!(!TrackingDirection::Progenitors.follows_descendants());
        assert!(!TrackingDirection::Descendants.follows_progenitors());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = DatabaseConfig::from_json_str(
            r#"{"tracking": {"direction": "progenitors"}, "layout": {"subhalo": "Subhaloes"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.tracking.direction, TrackingDirection::Progenitors);
        assert!(cfg.tracking.stop_at_mergers);
        assert_eq!(cfg.layout.subhalo, "Subhaloes");
        assert_eq!(cfg.layout.header, "Header");
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let mut cfg = DatabaseConfig::default();
        cfg.layout.header = "/".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidConfig { .. }));
    }

    #[test]
    fn test_validate_rejects_nested_group() {
        let err = DatabaseConfig::from_json_str(r#"{"layout": {"merger_tree": "Trees/Main"}}"#)
            .unwrap_err();
        assert!(format!("{err}").contains("merger_tree"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(DatabaseConfig::from_json_str("{").is_err());
    }

    #[test]
    fn test_builder_methods() {
        let cfg = DatabaseConfig::default()
            .with_direction(TrackingDirection::Descendants)
            .with_stop_at_mergers(false)
            .with_cache_columns(false);
        assert_eq!(cfg.tracking.direction, TrackingDirection::Descendants);
        assert!(!cfg.tracking.stop_at_mergers);
        assert!(!cfg.cache_columns);
    }
}

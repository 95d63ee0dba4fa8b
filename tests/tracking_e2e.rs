use eagle_db::{
    CatalogueSource, Column, Database, DatabaseConfig, DatabaseError, MemoryCatalogue,
    PropertyValue, TimeCoordinate, TrackingDirection,
};

// Three snapshots, one main branch (galaxies 0-2) and a satellite branch
// (galaxies 3-4) that merges into galaxy 0 at the last snapshot.
//
// | row | snap | GalaxyID | TopLeafID | DescendantID | Mass |
// |-----|------|----------|-----------|--------------|------|
// | 0   | 2    | 0        | 2         | -1           | 100  |
// | 1   | 1    | 1        | 2         | 0            | 50   |
// | 2   | 0    | 2        | 2         | 1            | 20   |
// | 3   | 1    | 3        | 4         | 0            | 8    |
// | 4   | 0    | 4        | 4         | 3            | 4    |
const CATALOGUE_JSON: &str = r#"{
    "attributes": {
        "Header": {
            "HubbleParam": 0.6777,
            "Omega0": 0.307,
            "OmegaLambda": 0.693,
            "BoxSize": 25,
            "NumPart_Total": 188183642
        }
    },
    "datasets": {
        "Snapshots/SnapNum": {"type": "int", "data": [0, 1, 2]},
        "Snapshots/Redshift": {"type": "float", "data": [2.0, 1.0, 0.0]},
        "Subhalo/SnapNum": {"type": "int", "data": [2, 1, 0, 1, 0]},
        "Subhalo/Mass": {"type": "float", "data": [100.0, 50.0, 20.0, 8.0, 4.0]},
        "Subhalo/Velocity": {
            "type": "float_vector",
            "data": {"width": 2, "values": [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]}
        },
        "MergerTree/GalaxyID": {"type": "int", "data": [0, 1, 2, 3, 4]},
        "MergerTree/TopLeafID": {"type": "int", "data": [2, 2, 2, 4, 4]},
        "MergerTree/DescendantID": {"type": "int", "data": [-1, 0, 1, 0, 3]}
    }
}"#;

fn catalogue() -> MemoryCatalogue {
    MemoryCatalogue::from_json_str(CATALOGUE_JSON).unwrap()
}

fn open(config: DatabaseConfig) -> Database {
    Database::from_source(catalogue(), config).unwrap()
}

#[test]
fn main_branch_is_followed_to_the_first_snapshot() {
    let db = open(DatabaseConfig::default());
    let halo = db.track_object(0, 2).unwrap();

    let mass = halo.get("Mass").unwrap();
    assert_eq!(mass.snapshots, vec![0, 1, 2]);
    assert_eq!(mass.values, Column::Float(vec![20.0, 50.0, 100.0]));

    let z = halo.get_time_coordinate(TimeCoordinate::Redshift).unwrap();
    assert_eq!(z, vec![2.0, 1.0, 0.0]);
    assert_eq!(z.len(), mass.len());
}

#[test]
fn satellite_stops_at_merger_by_default() {
    let db = open(DatabaseConfig::default());
    let satellite = db.track_object(1, 1).unwrap();
    assert_eq!(satellite.galaxy_id(), 3);
    assert_eq!(satellite.snapshots(), vec![0, 1]);
    assert_eq!(
        satellite.get("Mass").unwrap().values,
        Column::Float(vec![4.0, 8.0])
    );
}

#[test]
fn satellite_followed_into_host_when_mergers_allowed() {
    let db = open(DatabaseConfig::default().with_stop_at_mergers(false));
    let satellite = db.track_object(1, 1).unwrap();
    let mass = satellite.get("Mass").unwrap();
    assert_eq!(mass.snapshots, vec![0, 1, 2]);
    assert_eq!(mass.at_snapshot(2), Some(PropertyValue::Float(100.0)));
}

#[test]
fn progenitor_only_tracking_from_the_first_snapshot() {
    let db = open(DatabaseConfig::default().with_direction(TrackingDirection::Progenitors));
    let halo = db.track_object(0, 0).unwrap();
    assert_eq!(halo.chain().len(), 1);
    assert_eq!(halo.get("Mass").unwrap().values, Column::Float(vec![20.0]));
}

#[test]
fn vector_properties_keep_their_width() {
    let db = open(DatabaseConfig::default());
    let halo = db.track_object(0, 2).unwrap();
    let velocity = halo.get("Velocity").unwrap();
    assert_eq!(velocity.values.width(), 2);
    assert_eq!(velocity.at_snapshot(0), Some(PropertyValue::Vector(vec![4.0, 5.0])));
    assert!(matches!(
        halo.evolution(TimeCoordinate::Redshift, "Velocity"),
        Err(DatabaseError::NotScalar { .. })
    ));
}

#[test]
fn metadata_from_header_and_snapshot_table() {
    let db = open(DatabaseConfig::default());
    let meta = db.metadata();
    assert_eq!(meta.snapshot_count(), 3);
    assert_eq!(meta.cosmology.box_size, Some(25.0));
    assert_eq!(meta.cosmology.omega_baryon, None);

    let today = meta.snapshot(2).unwrap();
    assert!((today.expansion_factor - 1.0).abs() < 1e-12);
    assert!(today.universe_age > 13.7 && today.universe_age < 13.9);
    assert!((meta.snapshot(0).unwrap().expansion_factor - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn unknown_objects_and_properties() {
    let db = open(DatabaseConfig::default());
    assert!(db.track_object(1, 2).unwrap_err().is_not_found());
    assert!(db.track_object(0, 3).unwrap_err().is_not_found());

    let halo = db.track_object(0, 2).unwrap();
    assert!(halo.get("StellarMass").unwrap_err().is_property_not_found());
}

#[test]
fn time_coordinate_names_parse() {
    let kind: TimeCoordinate = "universe_age".parse().unwrap();
    assert_eq!(kind, TimeCoordinate::UniverseAge);
    assert!("lookback".parse::<TimeCoordinate>().is_err());

    let db = open(DatabaseConfig::default());
    let halo = db.track_object(0, 2).unwrap();
    let ages = halo.get_time_coordinate(kind).unwrap();
    assert!(ages.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn catalogue_and_config_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let catalogue_path = dir.path().join("catalogue.json");
    let config_path = dir.path().join("config.json");

    std::fs::write(&catalogue_path, catalogue().to_json_string().unwrap()).unwrap();
    std::fs::write(
        &config_path,
        r#"{"tracking": {"direction": "descendants", "stop_at_mergers": false}}"#,
    )
    .unwrap();

    let source = MemoryCatalogue::from_json_file(&catalogue_path).unwrap();
    assert!(source.has_dataset("MergerTree/DescendantID"));
    let config = DatabaseConfig::from_json_file(&config_path).unwrap();

    let db = Database::from_source(source, config).unwrap();
    let halo = db.track_object(1, 0).unwrap();
    assert_eq!(halo.snapshots(), vec![0, 1, 2]);
    assert!(halo.main_progenitors().is_empty());
    assert_eq!(halo.descendants().len(), 2);
}

#[test]
fn missing_merger_tree_is_schema_error() {
    let mut source = catalogue();
    source.remove_dataset("MergerTree/GalaxyID");
    let err = Database::from_source(source, DatabaseConfig::default()).unwrap_err();
    assert!(err.is_schema());
}

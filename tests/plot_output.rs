#![cfg(feature = "plot")]

use eagle_db::{Column, Database, DatabaseConfig, DatabaseError, MemoryCatalogue, PlotOptions, TimeCoordinate};

fn database() -> Database {
    let catalogue = MemoryCatalogue::new()
        .with_attribute("Header", "HubbleParam", 0.6777)
        .with_attribute("Header", "Omega0", 0.307)
        .with_attribute("Header", "OmegaLambda", 0.693)
        .with_dataset("Snapshots/ExpansionFactor", Column::Float(vec![0.25, 0.5, 1.0]))
        .with_dataset("Subhalo/SnapNum", Column::Int(vec![2, 1, 0]))
        .with_dataset("Subhalo/Mass", Column::Float(vec![1.0e12, 1.0e11, 0.0]))
        .with_dataset(
            "Subhalo/Velocity",
            Column::FloatVector {
                width: 2,
                values: vec![0.0; 6],
            },
        )
        .with_dataset("MergerTree/GalaxyID", Column::Int(vec![0, 1, 2]))
        .with_dataset("MergerTree/TopLeafID", Column::Int(vec![2, 2, 2]))
        .with_dataset("MergerTree/DescendantID", Column::Int(vec![-1, 0, 1]));
    Database::from_source(catalogue, DatabaseConfig::default()).unwrap()
}

#[test]
fn evolution_plot_is_written_as_svg() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mass_vs_age.svg");

    let db = database();
    let halo = db.track_object(0, 2).unwrap();
    halo.plot_evolution(TimeCoordinate::UniverseAge, "Mass", &out).unwrap();

    let svg = std::fs::read_to_string(&out).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Universe age"));
}

#[test]
fn log_plot_drops_empty_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("log_mass.svg");
    let options = PlotOptions {
        log_y: true,
        title: Some("Main branch".to_string()),
        ..PlotOptions::default()
    };

    let db = database();
    let halo = db.track_object(0, 2).unwrap();
    halo.plot_evolution_with(TimeCoordinate::ExpansionFactor, "Mass", &out, &options)
        .unwrap();
    assert!(std::fs::read_to_string(&out).unwrap().contains("Main branch"));
}

#[test]
fn vector_property_cannot_be_plotted() {
    let dir = tempfile::tempdir().unwrap();
    let db = database();
    let halo = db.track_object(0, 2).unwrap();
    let err = halo
        .plot_evolution(TimeCoordinate::Redshift, "Velocity", dir.path().join("v.svg"))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NotScalar { width: 2, .. }));
}

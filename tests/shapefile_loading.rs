//! Shapefile Loading Tests
//!
//! Writes small proposals to a temporary directory with the shapefile
//! writer and runs discovery, loading and the full scoring pipeline on them.

use approx::assert_relative_eq;
use design_scorer_rust::{
    CriterionCode, CriterionValue, EngineConfig, EngineError, LayerKind, LayerRepository,
    ProposalScorer,
};
use design_scorer_rust::utils::crs::Crs;
use design_scorer_rust::utils::geometry::layer_area;
use geo::CoordsIter;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, Polyline, Writer};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const UTM32_WKT: &str = r#"PROJCS["ETRS_1989_UTM_Zone_32N",GEOGCS["GCS_ETRS_1989",DATUM["D_ETRS_1989",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",9.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

const UTM33_WKT: &str = r#"PROJCS["ETRS_1989_UTM_Zone_33N",GEOGCS["GCS_ETRS_1989",DATUM["D_ETRS_1989",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",15.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

/// Clockwise rectangle ring, as shapefiles expect for outer rings
fn rect(x: f64, y: f64, width: f64, height: f64) -> Polygon {
    Polygon::new(PolygonRing::Outer(vec![
        Point::new(x, y),
        Point::new(x, y + height),
        Point::new(x + width, y + height),
        Point::new(x + width, y),
        Point::new(x, y),
    ]))
}

fn field(name: &str) -> FieldName {
    FieldName::try_from(name).unwrap()
}

fn write_prj(dir: &Path, stem: &str) {
    fs::write(dir.join(format!("{}.prj", stem)), UTM32_WKT).unwrap();
}

/// Polygon layer with an optional text `Nutzung` column
fn write_polygons(dir: &Path, stem: &str, shapes: &[Polygon], uses: Option<&[&str]>) {
    let table = match uses {
        Some(_) => TableWriterBuilder::new().add_character_field(field("Nutzung"), 32),
        None => TableWriterBuilder::new().add_numeric_field(field("id"), 10, 0),
    };
    let mut writer = Writer::from_path(dir.join(format!("{}.shp", stem)), table).unwrap();
    for (idx, shape) in shapes.iter().enumerate() {
        let mut record = Record::default();
        match uses {
            Some(uses) => record.insert("Nutzung".to_string(), FieldValue::Character(Some(uses[idx].to_string()))),
            None => record.insert("id".to_string(), FieldValue::Numeric(Some(idx as f64))),
        };
        writer.write_shape_and_record(shape, &record).unwrap();
    }
    write_prj(dir, stem);
}

fn write_buildings(dir: &Path, shapes: &[Polygon], heights: &[f64]) {
    let table = TableWriterBuilder::new().add_numeric_field(field("Geb_Hoehe"), 10, 2);
    let mut writer = Writer::from_path(dir.join("Gebaeude.shp"), table).unwrap();
    for (shape, height) in shapes.iter().zip(heights) {
        let mut record = Record::default();
        record.insert("Geb_Hoehe".to_string(), FieldValue::Numeric(Some(*height)));
        writer.write_shape_and_record(shape, &record).unwrap();
    }
    write_prj(dir, "Gebaeude");
}

fn write_points(dir: &Path, stem: &str, points: &[(f64, f64)]) {
    let table = TableWriterBuilder::new().add_numeric_field(field("id"), 10, 0);
    let mut writer = Writer::from_path(dir.join(format!("{}.shp", stem)), table).unwrap();
    for (idx, (x, y)) in points.iter().enumerate() {
        let mut record = Record::default();
        record.insert("id".to_string(), FieldValue::Numeric(Some(idx as f64)));
        writer.write_shape_and_record(&Point::new(*x, *y), &record).unwrap();
    }
    write_prj(dir, stem);
}

fn write_lines(dir: &Path, stem: &str, lines: &[Vec<(f64, f64)>]) {
    let table = TableWriterBuilder::new().add_numeric_field(field("id"), 10, 0);
    let mut writer = Writer::from_path(dir.join(format!("{}.shp", stem)), table).unwrap();
    for (idx, line) in lines.iter().enumerate() {
        let mut record = Record::default();
        record.insert("id".to_string(), FieldValue::Numeric(Some(idx as f64)));
        let points = line.iter().map(|(x, y)| Point::new(*x, *y)).collect();
        writer.write_shape_and_record(&Polyline::new(points), &record).unwrap();
    }
    write_prj(dir, stem);
}

/// Proposal nested two levels deep, plus a stale boundary in a later folder
fn sample_proposal() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let plans = root.path().join("abgabe").join("plaene");
    fs::create_dir_all(&plans).unwrap();

    write_polygons(&plans, "Gebietsabgrenzung", &[rect(0.0, 0.0, 50.0, 20.0)], None);
    write_polygons(
        &plans,
        "Verkehrsflaechen",
        &[rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 10.0, 4.0)],
        Some(&["Fuss_Rad", "Kfz_Flaeche"]),
    );
    write_polygons(
        &plans,
        "oeffentliche_Gruenflaechen",
        &[rect(0.0, 10.0, 10.0, 10.0), rect(10.0, 10.0, 10.0, 10.0)],
        Some(&["Spielplatz", " spielplatz "]),
    );
    write_polygons(&plans, "private_Gruenflaechen", &[rect(30.0, 10.0, 5.0, 10.0)], None);
    write_buildings(&plans, &[rect(40.0, 0.0, 5.0, 5.0)], &[12.0]);
    write_points(&plans, "Bestandsbaeume", &[(1.0, 1.0), (5.0, 5.0)]);
    write_points(&plans, "Baeume_Entwurf", &[(1.5, 1.0), (9.0, 9.0)]);

    let stale = root.path().join("z_alt");
    fs::create_dir_all(&stale).unwrap();
    write_polygons(&stale, "Gebietsabgrenzung", &[rect(0.0, 0.0, 5.0, 5.0)], None);

    root
}

#[test]
fn test_nested_layers_are_discovered() {
    let root = sample_proposal();
    let layers = LayerRepository::open(root.path()).unwrap();

    let boundary = layers.get(LayerKind::SiteBoundary).unwrap();
    assert_eq!(layer_area(boundary), 1000.0);
    assert_eq!(boundary.crs(), Some(&Crs::Epsg(25832)));

    let absent = layers.absent();
    assert!(absent.contains(&LayerKind::Water));
    assert!(!absent.contains(&LayerKind::TrafficAreas));
    assert_eq!(absent.len(), LayerKind::ALL.len() - 7);
}

#[test]
fn test_attribute_columns_are_loaded() {
    let root = sample_proposal();
    let layers = LayerRepository::open(root.path()).unwrap();

    let traffic = layers.get(LayerKind::TrafficAreas).unwrap();
    assert!(traffic.has_attribute("Nutzung"));
    assert_eq!(traffic.len(), 2);

    let buildings = layers.get(LayerKind::Buildings).unwrap();
    assert!(buildings.has_attribute("Geb_Hoehe"));
}

#[test]
fn test_full_run_writes_artifacts() {
    let root = sample_proposal();
    let scorer = ProposalScorer::new(EngineConfig::default());
    let score = scorer.score_and_write(root.path(), true).unwrap();

    assert_eq!(score.record.get(CriterionCode::K002), &CriterionValue::Value(4.0));
    assert_eq!(score.record.get(CriterionCode::K003), &CriterionValue::Value(0.25));
    assert_eq!(score.record.get(CriterionCode::K008), &CriterionValue::Value(1.0));
    assert_eq!(score.record.get(CriterionCode::K013), &CriterionValue::Value(0.5));
    assert_eq!(score.record.get(CriterionCode::K015), &CriterionValue::Value(1.0));
    assert_eq!(score.reference_crs, Crs::Epsg(25832));

    let csv = fs::read_to_string(root.path().join("Kriterien_Ergebnisse.csv")).unwrap();
    assert!(csv.starts_with("K002,K003,K004,K005,K006,K007,K008,K009,K010,K011,K012,K013,K015"));
    assert_eq!(csv.lines().count(), 2);

    let report = fs::read_to_string(root.path().join("Kriterien_Bericht.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(json["criteria"].as_array().unwrap().len(), 13);
    assert!(json["absent_layers"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "Wasser"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let root = sample_proposal();
    let scorer = ProposalScorer::new(EngineConfig::default());
    let csv_path = root.path().join("Kriterien_Ergebnisse.csv");
    let json_path = root.path().join("Kriterien_Bericht.json");

    scorer.score_and_write(root.path(), true).unwrap();
    let first = (fs::read(&csv_path).unwrap(), fs::read(&json_path).unwrap());
    scorer.score_and_write(root.path(), true).unwrap();
    let second = (fs::read(&csv_path).unwrap(), fs::read(&json_path).unwrap());

    assert_eq!(first, second);
}

#[test]
fn test_report_can_be_skipped() {
    let root = sample_proposal();
    ProposalScorer::new(EngineConfig::default())
        .score_and_write(root.path(), false)
        .unwrap();
    assert!(root.path().join("Kriterien_Ergebnisse.csv").exists());
    assert!(!root.path().join("Kriterien_Bericht.json").exists());
}

#[test]
fn test_corrupt_layer_counts_as_absent() {
    let root = sample_proposal();
    fs::write(root.path().join("Wasser.shp"), b"not a shapefile").unwrap();

    let layers = LayerRepository::open(root.path()).unwrap();
    assert!(layers.get(LayerKind::Water).is_none());
    assert!(layers.get(LayerKind::SiteBoundary).is_some());
}

#[test]
fn test_boundary_in_other_zone_is_aligned_to_centerlines() {
    let root = tempfile::tempdir().unwrap();

    // Centerlines in UTM 32N around 12°E 52°N
    write_lines(root.path(), "Verkehrsmittellinie", &[vec![(711_000.0, 5_765_000.0), (711_100.0, 5_765_000.0)]]);

    // Boundary of 50 x 20 m drawn in UTM 33N
    write_polygons(root.path(), "Gebietsabgrenzung", &[rect(300_000.0, 5_764_000.0, 50.0, 20.0)], None);
    fs::write(root.path().join("Gebietsabgrenzung.prj"), UTM33_WKT).unwrap();

    let score = ProposalScorer::new(EngineConfig::default())
        .score_directory(root.path())
        .unwrap();
    assert_eq!(score.reference_crs, Crs::Epsg(25832));
    assert_relative_eq!(score.area_basis.value().unwrap(), 1000.0, max_relative = 1e-3);

    let mut layers = LayerRepository::open(root.path()).unwrap();
    layers.align_to(&score.reference_crs);
    let boundary = layers.get(LayerKind::SiteBoundary).unwrap();
    assert_eq!(boundary.crs(), Some(&Crs::Epsg(25832)));
    let corner = boundary.geometries().next().unwrap().coords_iter().next().unwrap();
    assert!(corner.x > 600_000.0, "boundary not reprojected: x = {}", corner.x);
}

#[test]
fn test_missing_root_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("does_not_exist");
    let err = ProposalScorer::new(EngineConfig::default())
        .score_directory(&missing)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::InputRoot(_))
    ));
}

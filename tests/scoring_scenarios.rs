//! Scoring Scenario Tests
//!
//! Runs the full 13-criterion pipeline on small in-memory proposals and
//! checks the documented boundary scenarios.

use approx::assert_relative_eq;
use design_scorer_rust::metrics::k002_mobility::{score_class, TrafficSplit};
use design_scorer_rust::scorer::area_basis;
use design_scorer_rust::{
    BaselinePolicy, CriterionCode, CriterionValue, EngineConfig, FeatureRecord, Layer, LayerKind,
    LayerRepository, ProposalScorer,
};
use geo::{point, polygon, Geometry};

fn rect(x: f64, y: f64, width: f64, height: f64) -> Geometry<f64> {
    Geometry::Polygon(polygon![
        (x: x, y: y),
        (x: x + width, y: y),
        (x: x + width, y: y + height),
        (x: x, y: y + height),
    ])
}

fn tree(x: f64, y: f64) -> Geometry<f64> {
    Geometry::Point(point! { x: x, y: y })
}

fn traffic(areas: &[(&str, Geometry<f64>)]) -> Layer {
    let uses: Vec<&str> = areas.iter().map(|(u, _)| *u).collect();
    Layer::from_geometries(LayerKind::TrafficAreas, areas.iter().map(|(_, g)| g.clone()))
        .with_text_attribute("Nutzung", &uses)
        .unwrap()
}

/// Boundary 1000, public green 200, private green 50, no existing green
fn green_proposal() -> LayerRepository {
    let mut layers = LayerRepository::new();
    layers.insert(Layer::from_geometries(LayerKind::SiteBoundary, vec![rect(0.0, 0.0, 50.0, 20.0)]));
    layers.insert(Layer::from_geometries(LayerKind::PublicGreen, vec![rect(0.0, 0.0, 20.0, 10.0)]));
    layers.insert(Layer::from_geometries(LayerKind::PrivateGreen, vec![rect(30.0, 0.0, 5.0, 10.0)]));
    layers
}

fn score(layers: &LayerRepository, config: EngineConfig) -> FeatureRecord {
    ProposalScorer::new(config).score_layers(layers, area_basis(layers))
}

#[test]
fn test_record_always_has_thirteen_keys() {
    let record = score(&LayerRepository::new(), EngineConfig::default());
    let keys: Vec<String> = record.iter().map(|(code, _)| code.to_string()).collect();
    assert_eq!(
        keys,
        ["K002", "K003", "K004", "K005", "K006", "K007", "K008", "K009", "K010", "K011", "K012", "K013", "K015"]
    );
    assert_eq!(record.to_dataframe().unwrap().width(), 13);
}

#[test]
fn test_missing_boundary_leaves_area_criteria_missing() {
    let mut layers = LayerRepository::new();
    layers.insert(Layer::from_geometries(LayerKind::PublicGreen, vec![rect(0.0, 0.0, 20.0, 10.0)]));
    layers.insert(Layer::from_geometries(LayerKind::PrivateGreen, vec![rect(30.0, 0.0, 5.0, 10.0)]));

    let record = score(&layers, EngineConfig::default());
    assert!(record.get(CriterionCode::K003).is_missing());
    assert!(record.get(CriterionCode::K010).is_missing());
    assert_eq!(record.get(CriterionCode::K015), &CriterionValue::Value(1.0));
}

#[test]
fn test_open_space_share_and_unsealing_defaults() {
    let layers = green_proposal();

    let record = score(&layers, EngineConfig::default());
    assert_relative_eq!(record.get(CriterionCode::K003).zero_filled(), 0.25);
    assert_eq!(record.get(CriterionCode::K010), &CriterionValue::Value(0.0));

    let config = EngineConfig {
        baseline_policy: BaselinePolicy::NewGreenProxy,
        ..EngineConfig::default()
    };
    let record = score(&layers, config);
    assert_relative_eq!(record.get(CriterionCode::K010).zero_filled(), 0.25);
}

#[test]
fn test_k002_pedestrian_dominant() {
    let mut layers = LayerRepository::new();
    layers.insert(traffic(&[
        ("Fuss_Rad", rect(0.0, 0.0, 10.0, 10.0)),
        ("Kfz_Flaeche", rect(20.0, 0.0, 10.0, 4.0)),
    ]));
    let record = score(&layers, EngineConfig::default());
    assert_eq!(record.get(CriterionCode::K002), &CriterionValue::Value(4.0));
}

#[test]
fn test_k002_pedestrian_only() {
    let mut layers = LayerRepository::new();
    layers.insert(traffic(&[("Fuss_Rad", rect(0.0, 0.0, 10.0, 5.0))]));
    let record = score(&layers, EngineConfig::default());
    assert_eq!(record.get(CriterionCode::K002), &CriterionValue::Value(5.0));
}

#[test]
fn test_k002_missing_without_use_attribute() {
    let mut layers = LayerRepository::new();
    layers.insert(Layer::from_geometries(LayerKind::TrafficAreas, vec![rect(0.0, 0.0, 10.0, 5.0)]));
    let record = score(&layers, EngineConfig::default());
    assert!(record.get(CriterionCode::K002).is_missing());
}

#[test]
fn test_k002_class_is_monotonic() {
    let mut previous = 0.0;
    for step in 0..=20 {
        let shift = step as f64 * 5.0;
        let split = TrafficSplit {
            pedestrian: 20.0 + shift,
            motor_vehicle: (100.0 - shift).max(0.0),
            shared: 10.0,
        };
        let class = score_class(&split);
        assert!(class >= previous, "class dropped at step {}", step);
        previous = class;
    }
}

#[test]
fn test_k013_six_of_ten_trees_preserved() {
    let existing: Vec<_> = (0..10).map(|i| tree(i as f64 * 5.0, 0.0)).collect();
    let proposed: Vec<_> = (0..10)
        .map(|i| {
            let offset = if i < 6 { 0.7 } else { 2.0 };
            tree(i as f64 * 5.0, offset)
        })
        .collect();

    let mut layers = LayerRepository::new();
    layers.insert(Layer::from_geometries(LayerKind::ExistingTrees, existing));
    layers.insert(Layer::from_geometries(LayerKind::ProposedTrees, proposed));

    let record = score(&layers, EngineConfig::default());
    assert_relative_eq!(record.get(CriterionCode::K013).zero_filled(), 0.60);
}

#[test]
fn test_k015_is_never_missing() {
    let only_public = {
        let mut layers = LayerRepository::new();
        layers.insert(Layer::from_geometries(LayerKind::PublicGreen, vec![rect(0.0, 0.0, 1.0, 1.0)]));
        layers
    };
    for layers in [LayerRepository::new(), only_public, green_proposal()] {
        let record = score(&layers, EngineConfig::default());
        assert!(!record.get(CriterionCode::K015).is_missing());
    }
}

#[test]
fn test_scoring_is_repeatable() {
    let mut layers = green_proposal();
    layers.insert(traffic(&[
        ("Fuss_Rad", rect(0.0, 0.0, 10.0, 10.0)),
        ("Begegnungszone", rect(20.0, 0.0, 10.0, 10.0)),
    ]));
    let first = score(&layers, EngineConfig::default());
    let second = score(&layers, EngineConfig::default());
    assert_eq!(first, second);
}

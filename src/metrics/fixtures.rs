//! Small geometry builders for calculator tests

use crate::config::EngineConfig;
use crate::data::{Layer, LayerKind, LayerRepository};
use geo::{point, polygon, Geometry};

/// Axis-aligned square with its lower-left corner at (x, y)
pub fn square(x: f64, y: f64, size: f64) -> Geometry<f64> {
    rect(x, y, size, size)
}

pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Geometry<f64> {
    Geometry::Polygon(polygon![
        (x: x, y: y),
        (x: x + width, y: y),
        (x: x + width, y: y + height),
        (x: x, y: y + height),
    ])
}

pub fn pt(x: f64, y: f64) -> Geometry<f64> {
    Geometry::Point(point! { x: x, y: y })
}

pub fn layer(kind: LayerKind, geometries: Vec<Geometry<f64>>) -> Layer {
    Layer::from_geometries(kind, geometries)
}

pub fn repository(layers: Vec<Layer>) -> LayerRepository {
    let mut repository = LayerRepository::new();
    for layer in layers {
        repository.insert(layer);
    }
    repository
}

pub fn config() -> EngineConfig {
    EngineConfig::default()
}

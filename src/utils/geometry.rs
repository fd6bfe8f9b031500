//! Geometry helpers shared by the criterion calculators
//!
//! **Robust overlay recipe** (used by every calculator that intersects layers):
//!   1. keep only polygonal parts (lines and points never take part in overlay)
//!   2. drop geometries with non-finite coordinates
//!   3. repair each polygon by a unary union; like a zero-width buffer this
//!      keeps a valid polygon, and a bow tie keeps only one lobe
//!   4. union many polygons in one `unary_union` call, never by pairwise folding
//!   5. treat overlap areas at or below the noise threshold as no overlap

use crate::data::Layer;
use geo::{
    unary_union, Area, BooleanOps, Buffer, CoordsIter, Geometry, Intersects, MultiPolygon, Polygon,
};

/// Area of one geometry; lines and points contribute zero
pub fn geometry_area(geometry: &Geometry<f64>) -> f64 {
    geometry.unsigned_area()
}

/// Summed area of all features of a layer (no dissolve, overlaps count twice)
pub fn layer_area(layer: &Layer) -> f64 {
    layer.geometries().map(geometry_area).sum()
}

/// Mean feature area over features that carry a geometry
pub fn mean_feature_area(layer: &Layer) -> Option<f64> {
    let areas: Vec<f64> = layer.geometries().map(geometry_area).collect();
    if areas.is_empty() {
        None
    } else {
        Some(areas.iter().sum::<f64>() / areas.len() as f64)
    }
}

fn has_finite_coords(geometry: &Geometry<f64>) -> bool {
    geometry.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

/// Polygonal parts of a geometry, flattening multi-polygons and collections
pub fn polygon_parts(geometry: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(polygon_parts).collect(),
        _ => Vec::new(),
    }
}

/// Repair a polygonal geometry; `None` when nothing with area survives
pub fn repair(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    if !has_finite_coords(geometry) {
        return None;
    }
    let parts = polygon_parts(geometry);
    if parts.is_empty() {
        return None;
    }
    let repaired = unary_union(&parts);
    if repaired.0.is_empty() {
        None
    } else {
        Some(repaired)
    }
}

/// Repaired polygonal features of a layer, keeping the feature index
pub fn polygonal_features(layer: &Layer) -> Vec<(usize, MultiPolygon<f64>)> {
    layer
        .features()
        .filter_map(|(idx, geometry)| geometry.and_then(repair).map(|mp| (idx, mp)))
        .collect()
}

/// Union of all polygonal geometries of the given layers in a single pass
pub fn union_layers(layers: &[&Layer]) -> MultiPolygon<f64> {
    let polygons: Vec<Polygon<f64>> = layers
        .iter()
        .flat_map(|layer| polygonal_features(layer))
        .flat_map(|(_, mp)| mp.0)
        .collect();
    unary_union(&polygons)
}

/// Planar buffer around any geometry (lines, points and polygons alike)
pub fn buffer_geometry(geometry: &Geometry<f64>, distance: f64) -> MultiPolygon<f64> {
    if !has_finite_coords(geometry) {
        return MultiPolygon::new(Vec::new());
    }
    geometry.buffer(distance)
}

/// Buffer every geometry and dissolve the result into one multi-polygon
pub fn buffer_union<'a>(
    geometries: impl IntoIterator<Item = &'a Geometry<f64>>,
    distance: f64,
) -> MultiPolygon<f64> {
    let polygons: Vec<Polygon<f64>> = geometries
        .into_iter()
        .flat_map(|g| buffer_geometry(g, distance).0)
        .collect();
    unary_union(&polygons)
}

/// Area of the intersection of two multi-polygons
pub fn overlap_area(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    if a.0.is_empty() || b.0.is_empty() {
        return 0.0;
    }
    a.intersection(b).unsigned_area()
}

/// True overlap (not mere touching) between two multi-polygons
pub fn overlaps(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, noise_threshold: f64) -> bool {
    overlap_area(a, b) > noise_threshold
}

/// Whether a geometry touches or overlaps a zone at all
pub fn intersects_zone(geometry: &Geometry<f64>, zone: &MultiPolygon<f64>) -> bool {
    !zone.0.is_empty() && has_finite_coords(geometry) && geometry.intersects(zone)
}

/// Round to two decimals, halves to even (0.125 -> 0.12, 0.625 -> 0.62)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

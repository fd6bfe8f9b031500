//! K013: Preservation of existing trees
//!
//! Each proposed tree is matched to its nearest existing tree; it counts as
//! preserved when that tree lies within the match distance. Trees drawn as
//! polygons (crowns) are represented by their centroid.
//!
//! score = preserved proposed trees / all proposed trees, two decimals

use super::{CriterionContext, CriterionResult, MissingReason};
use crate::data::{Layer, LayerKind};
use crate::utils::geometry::round2;
use geo::{Centroid, Geometry};
use rstar::{PointDistance, RTree};
use tracing::debug;

fn tree_position(geometry: &Geometry<f64>) -> Option<[f64; 2]> {
    let p = match geometry {
        Geometry::Point(p) => *p,
        other => other.centroid()?,
    };
    (p.x().is_finite() && p.y().is_finite()).then(|| [p.x(), p.y()])
}

fn positions(layer: &Layer) -> Vec<Option<[f64; 2]>> {
    layer
        .features()
        .map(|(_, g)| g.and_then(tree_position))
        .collect()
}

pub fn calculate_k013(ctx: &CriterionContext<'_>) -> CriterionResult {
    let proposed = ctx.require_non_empty(LayerKind::ProposedTrees)?;
    let existing = ctx.require_non_empty(LayerKind::ExistingTrees)?;

    let existing_index: RTree<[f64; 2]> = RTree::bulk_load(positions(existing).into_iter().flatten().collect());
    if existing_index.size() == 0 {
        return Err(MissingReason::NoData("existing trees have no usable position"));
    }

    let max_distance_2 = ctx.config.tree_match_distance.powi(2);
    let proposed_positions = positions(proposed);
    let matched = proposed_positions
        .iter()
        .flatten()
        .filter(|p| {
            existing_index
                .nearest_neighbor(*p)
                .is_some_and(|nearest| nearest.distance_2(*p) <= max_distance_2)
        })
        .count();

    debug!(matched, proposed = proposed_positions.len(), "K013 tree matching");
    Ok(round2(matched as f64 / proposed_positions.len() as f64))
}

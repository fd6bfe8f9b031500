//! K011: Emergency access, minimum path width
//!
//! The traffic centerlines are widened into a corridor (half width on each
//! side). The corridor must be free of buildings, green areas and plazas:
//! any overlap above the noise threshold fails the criterion. Touching along
//! an edge is not an overlap.
//!
//! **Score**: 1 clear, 0 obstructed.

use super::{CriterionContext, CriterionResult};
use crate::data::LayerKind;
use crate::utils::geometry::{buffer_union, overlap_area, union_layers};
use tracing::debug;

const OBSTACLE_LAYERS: [LayerKind; 4] = [
    LayerKind::Buildings,
    LayerKind::PublicGreen,
    LayerKind::PrivateGreen,
    LayerKind::PublicPlazas,
];

pub fn calculate_k011(ctx: &CriterionContext<'_>) -> CriterionResult {
    let centerlines = ctx.require(LayerKind::TrafficCenterlines)?;
    let obstacle_layers = ctx.require_any(&OBSTACLE_LAYERS)?;

    let corridor = buffer_union(centerlines.geometries(), ctx.config.corridor_half_width);
    let obstacles = union_layers(&obstacle_layers);

    let blocked = overlap_area(&corridor, &obstacles);
    debug!(blocked_area = blocked, "K011 corridor overlap");

    Ok(if blocked > ctx.config.overlap_noise_threshold { 0.0 } else { 1.0 })
}

//! K004: Embedding into the surroundings
//!
//! Compares the grain of the proposal with its context: mean footprint area
//! of the proposed buildings over mean footprint area of the surrounding
//! buildings.

use super::{CriterionContext, CriterionResult, MissingReason};
use crate::data::LayerKind;
use crate::utils::geometry::mean_feature_area;

/// Map a grain ratio onto the K004 score
pub fn grain_score(ratio: f64) -> f64 {
    if (0.75..=1.25).contains(&ratio) {
        2.0
    } else if (0.5..0.75).contains(&ratio) || (ratio > 1.25 && ratio <= 1.5) {
        1.5
    } else {
        1.0
    }
}

pub fn calculate_k004(ctx: &CriterionContext<'_>) -> CriterionResult {
    let buildings = ctx.require(LayerKind::Buildings)?;
    let context = ctx.require(LayerKind::ContextBuildings)?;

    let proposal_mean = mean_feature_area(buildings).ok_or(MissingReason::LayerEmpty(LayerKind::Buildings))?;
    let context_mean =
        mean_feature_area(context).ok_or(MissingReason::LayerEmpty(LayerKind::ContextBuildings))?;
    if context_mean <= 0.0 {
        return Err(MissingReason::ZeroDenominator("mean context footprint"));
    }

    Ok(grain_score(proposal_mean / context_mean))
}

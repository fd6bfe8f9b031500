//! K003: Share of open space
//!
//! (public green + private green) / site area, rounded to two decimals.
//! An absent green layer contributes zero area; an undefined site area makes
//! the criterion missing.

use super::{CriterionContext, CriterionResult};
use crate::data::LayerKind;
use crate::utils::geometry::{layer_area, round2};

/// Summed area of public and private green, absent layers counting zero
pub fn new_green_area(ctx: &CriterionContext<'_>) -> f64 {
    [LayerKind::PublicGreen, LayerKind::PrivateGreen]
        .into_iter()
        .filter_map(|kind| ctx.optional(kind))
        .map(layer_area)
        .sum()
}

pub fn calculate_k003(ctx: &CriterionContext<'_>) -> CriterionResult {
    let basis = ctx.area_basis.positive()?;
    Ok(round2(new_green_area(ctx) / basis))
}

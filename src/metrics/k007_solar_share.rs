//! K007: Energy standard, share of PV
//!
//! PV panel area over total building footprint (taken as roof area).

use super::{CriterionContext, CriterionResult, MissingReason};
use crate::data::LayerKind;
use crate::utils::geometry::{layer_area, round2};

/// Area of `cover` over building footprint area, two decimals
pub fn roof_share(ctx: &CriterionContext<'_>, cover: LayerKind) -> CriterionResult {
    let buildings = ctx.require(LayerKind::Buildings)?;
    let cover = ctx.require(cover)?;

    let roof_area = layer_area(buildings);
    if roof_area <= 0.0 {
        return Err(MissingReason::ZeroDenominator("building footprint area"));
    }
    Ok(round2(layer_area(cover) / roof_area))
}

pub fn calculate_k007(ctx: &CriterionContext<'_>) -> CriterionResult {
    roof_share(ctx, LayerKind::SolarPanels)
}

//! K009: Access to water
//!
//! **Scale**:
//!   - 0: no water in the proposal
//!   - 1: water present but not reachable from public green or plazas
//!   - 2: water within the access buffer of public green or plazas
//!
//! A water layer without features counts as no water (0), unlike the older
//! engine which scored any loaded water layer at least 1.

use super::{CriterionContext, CriterionResult};
use crate::data::LayerKind;
use crate::utils::geometry::{buffer_union, intersects_zone};

pub fn calculate_k009(ctx: &CriterionContext<'_>) -> CriterionResult {
    let Some(water) = ctx.layers.get_non_empty(LayerKind::Water) else {
        return Ok(0.0);
    };

    let access_geometries: Vec<_> = [LayerKind::PublicGreen, LayerKind::PublicPlazas]
        .into_iter()
        .filter_map(|kind| ctx.optional(kind))
        .flat_map(|layer| layer.geometries())
        .collect();
    if access_geometries.is_empty() {
        return Ok(1.0);
    }

    let access_zone = buffer_union(access_geometries, ctx.config.water_access_buffer);
    let reachable = water.geometries().any(|g| intersects_zone(g, &access_zone));

    Ok(if reachable { 2.0 } else { 1.0 })
}

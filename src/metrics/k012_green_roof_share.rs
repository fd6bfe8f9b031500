//! K012: Share of green roofs
//!
//! Green-roof area over building footprint area (taken as roof area).

use super::{CriterionContext, CriterionResult};
use crate::data::LayerKind;
use crate::metrics::k007_solar_share::roof_share;

pub fn calculate_k012(ctx: &CriterionContext<'_>) -> CriterionResult {
    roof_share(ctx, LayerKind::GreenRoofs)
}

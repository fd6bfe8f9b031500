//! K010: Unsealing
//!
//! Change of the green share of the site: (new green − existing green) / site
//! area, rounded to two decimals. New green is public plus private green.
//!
//! Without an existing-green baseline the result follows `BaselinePolicy`:
//! `ZeroFill` gives 0.0, `NewGreenProxy` gives new green / site area.

use super::{CriterionContext, CriterionResult};
use crate::config::BaselinePolicy;
use crate::data::LayerKind;
use crate::metrics::k003_open_space_share::new_green_area;
use crate::utils::geometry::{layer_area, round2};
use tracing::debug;

pub fn calculate_k010(ctx: &CriterionContext<'_>) -> CriterionResult {
    let basis = ctx.area_basis.positive()?;
    ctx.require_any(&[LayerKind::PublicGreen, LayerKind::PrivateGreen])?;

    let new_green = new_green_area(ctx);

    match ctx.layers.get_non_empty(LayerKind::ExistingGreen) {
        Some(existing) => {
            let existing_green = layer_area(existing);
            debug!(new_green, existing_green, basis, "K010 green balance");
            Ok(round2((new_green - existing_green) / basis))
        }
        None => match ctx.config.baseline_policy {
            BaselinePolicy::ZeroFill => Ok(0.0),
            BaselinePolicy::NewGreenProxy => Ok(round2(new_green / basis)),
        },
    }
}

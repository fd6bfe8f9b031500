//! K008: Diverse open spaces
//!
//! Number of distinct uses of the public green (`oeffentliche_Gruenflaechen.Nutzung`,
//! trimmed and case-folded), plus one when the proposal has public plazas.

use super::{CriterionContext, CriterionResult, MissingReason};
use crate::data::LayerKind;
use crate::utils::attributes::{distinct_categories, text_values};
use tracing::warn;

pub const USE_ATTRIBUTE: &str = "Nutzung";

pub fn calculate_k008(ctx: &CriterionContext<'_>) -> CriterionResult {
    let green_uses = match ctx.optional(LayerKind::PublicGreen) {
        Some(green) => match text_values(green, USE_ATTRIBUTE) {
            Ok(values) => distinct_categories(values.iter().map(|v| v.as_deref())).len(),
            Err(reason) => {
                warn!(criterion = "K008", "{}", reason);
                0
            }
        },
        None => 0,
    };

    let plaza_bonus = usize::from(ctx.layers.get_non_empty(LayerKind::PublicPlazas).is_some());

    let total = green_uses + plaza_bonus;
    if total == 0 {
        return Err(MissingReason::NoData("no open-space uses and no plazas"));
    }
    Ok(total as f64)
}

//! K015: Zoning of open spaces
//!
//! 1 when the proposal distinguishes public and private green (both layers
//! present with features), otherwise 0. Never missing.

use super::{CriterionContext, CriterionResult};
use crate::data::LayerKind;

pub fn calculate_k015(ctx: &CriterionContext<'_>) -> CriterionResult {
    let has_public = ctx.layers.get_non_empty(LayerKind::PublicGreen).is_some();
    let has_private = ctx.layers.get_non_empty(LayerKind::PrivateGreen).is_some();
    Ok(if has_public && has_private { 1.0 } else { 0.0 })
}

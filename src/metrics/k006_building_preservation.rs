//! K006: Preservation of existing buildings
//!
//! Context buildings inside the site are assumed to be the existing stock.
//! A context footprint counts as preserved when a proposed building overlaps
//! it (after a small tolerance buffer absorbing digitising offsets).
//!
//! score = min(preserved context footprints / proposed footprints, 1)

use super::{CriterionContext, CriterionResult, MissingReason};
use crate::data::LayerKind;
use crate::utils::geometry::{overlaps, polygonal_features, round2, union_layers};
use geo::{BooleanOps, Buffer, MultiPolygon};
use rustc_hash::FxHashSet;
use tracing::debug;

pub fn calculate_k006(ctx: &CriterionContext<'_>) -> CriterionResult {
    let buildings = ctx.require(LayerKind::Buildings)?;
    let context = ctx.require(LayerKind::ContextBuildings)?;
    let boundary = ctx.require(LayerKind::SiteBoundary)?;

    let proposed = polygonal_features(buildings);
    if proposed.is_empty() {
        return Err(MissingReason::ZeroDenominator("no proposed building footprints"));
    }

    let site = union_layers(&[boundary]);
    if site.0.is_empty() {
        return Err(MissingReason::NoData("site boundary has no polygon"));
    }

    // Clip the existing stock to the site, then widen by the tolerance
    let existing: Vec<(usize, MultiPolygon<f64>)> = polygonal_features(context)
        .into_iter()
        .filter_map(|(idx, footprint)| {
            let clipped = footprint.intersection(&site);
            if clipped.0.is_empty() {
                return None;
            }
            Some((idx, clipped.buffer(ctx.config.context_buffer)))
        })
        .collect();

    let threshold = ctx.config.overlap_noise_threshold;
    let preserved: FxHashSet<usize> = existing
        .iter()
        .filter(|(_, zone)| proposed.iter().any(|(_, footprint)| overlaps(footprint, zone, threshold)))
        .map(|(idx, _)| *idx)
        .collect();

    debug!(
        proposed = proposed.len(),
        existing_in_site = existing.len(),
        preserved = preserved.len(),
        "K006 overlay"
    );
    let share = preserved.len() as f64 / proposed.len() as f64;
    Ok(round2(share.min(1.0)))
}

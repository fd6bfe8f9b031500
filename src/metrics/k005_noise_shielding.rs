//! K005: Noise shielding
//!
//! Buildings next to motor traffic should be taller than the rest so they
//! shield the interior. Motor-traffic areas are buffered; buildings touching
//! the buffer are "near", all others "far".
//!
//! **Score**: near mean height > far → 2, equal → 1, lower → 0.

use super::{CriterionContext, CriterionResult, MissingReason};
use crate::data::LayerKind;
use crate::metrics::k002_mobility::USE_ATTRIBUTE;
use crate::utils::attributes::{mean, numeric_values, text_values};
use crate::utils::geometry::{buffer_union, intersects_zone};
use tracing::debug;

pub const HEIGHT_ATTRIBUTE: &str = "Geb_Hoehe";

/// Compare mean heights of near and far buildings
pub fn shielding_score(near_mean: f64, far_mean: f64) -> f64 {
    if near_mean > far_mean {
        2.0
    } else if near_mean == far_mean {
        1.0
    } else {
        0.0
    }
}

pub fn calculate_k005(ctx: &CriterionContext<'_>) -> CriterionResult {
    let buildings = ctx.require(LayerKind::Buildings)?;
    let traffic = ctx.require(LayerKind::TrafficAreas)?;
    let heights = numeric_values(buildings, HEIGHT_ATTRIBUTE)?;
    let uses = text_values(traffic, USE_ATTRIBUTE)?;

    let noise_sources = &ctx.config.traffic_uses.noise_sources;
    let motor_geometries = traffic
        .features()
        .zip(uses.iter())
        .filter(|(_, u)| u.as_deref().is_some_and(|u| noise_sources.iter().any(|c| c == u)))
        .filter_map(|((_, g), _)| g);

    let zone = buffer_union(motor_geometries, ctx.config.noise_buffer);
    if zone.0.is_empty() {
        return Err(MissingReason::NoData("no motor-vehicle traffic area"));
    }

    let mut near = Vec::new();
    let mut far = Vec::new();
    for ((_, geometry), height) in buildings.features().zip(heights.iter()) {
        let Some(geometry) = geometry else { continue };
        let is_near = intersects_zone(geometry, &zone);
        if let Some(h) = height {
            if is_near {
                near.push(*h);
            } else {
                far.push(*h);
            }
        }
    }

    debug!(near = near.len(), far = far.len(), "K005 building split");
    let near_mean = mean(near).ok_or(MissingReason::NoData("no heights next to motor traffic"))?;
    let far_mean = mean(far).ok_or(MissingReason::NoData("no heights away from motor traffic"))?;

    Ok(shielding_score(near_mean, far_mean))
}

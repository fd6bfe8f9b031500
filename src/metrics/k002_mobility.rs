//! K002: Future-proof mobility
//!
//! Compares the area given to walking and cycling with the area given to
//! motor vehicles in the traffic-area layer (`Verkehrsflaechen.Nutzung`).
//! Shared-use zones count half towards motor-vehicle area.
//!
//! **Score classes**:
//!   - 5: no motor-vehicle or shared area at all, but pedestrian area exists
//!   - 4: ratio > 2
//!   - 3: ratio > 1
//!   - 2: ratio > 0.5
//!   - 1: otherwise

use super::{CriterionContext, CriterionResult};
use crate::data::LayerKind;
use crate::utils::attributes::text_values;
use crate::utils::geometry::geometry_area;
use tracing::debug;

pub const USE_ATTRIBUTE: &str = "Nutzung";

/// Traffic area partitioned by use
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrafficSplit {
    pub pedestrian: f64,
    pub motor_vehicle: f64,
    pub shared: f64,
}

impl TrafficSplit {
    /// Motor-vehicle-equivalent area `M + 0.5·S`
    pub fn motor_equivalent(&self) -> f64 {
        self.motor_vehicle + 0.5 * self.shared
    }
}

/// Map an area split onto the K002 score class
pub fn score_class(split: &TrafficSplit) -> f64 {
    let a = split.motor_equivalent();
    if a == 0.0 && split.pedestrian > 0.0 {
        return 5.0;
    }
    let ratio = if a > 0.0 { split.pedestrian / a } else { 0.0 };
    if ratio > 2.0 {
        4.0
    } else if ratio > 1.0 {
        3.0
    } else if ratio > 0.5 {
        2.0
    } else {
        1.0
    }
}

pub fn calculate_k002(ctx: &CriterionContext<'_>) -> CriterionResult {
    let traffic = ctx.require(LayerKind::TrafficAreas)?;
    let uses = text_values(traffic, USE_ATTRIBUTE)?;
    let categories = &ctx.config.traffic_uses;

    let mut split = TrafficSplit::default();
    for ((_, geometry), use_value) in traffic.features().zip(uses.iter()) {
        let (Some(geometry), Some(use_value)) = (geometry, use_value.as_deref()) else {
            continue;
        };
        let area = geometry_area(geometry);
        if categories.pedestrian.iter().any(|c| c == use_value) {
            split.pedestrian += area;
        } else if categories.motor_vehicle.iter().any(|c| c == use_value) {
            split.motor_vehicle += area;
        } else if categories.shared.iter().any(|c| c == use_value) {
            split.shared += area;
        }
    }

    debug!(
        pedestrian = split.pedestrian,
        motor_vehicle = split.motor_vehicle,
        shared = split.shared,
        "K002 traffic split"
    );
    Ok(score_class(&split))
}

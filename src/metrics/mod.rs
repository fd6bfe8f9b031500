//! Criterion calculators K002–K015
//!
//! Each criterion lives in its own module and is a pure function of the
//! loaded layers, the area basis and the engine configuration. A calculator
//! checks its own preconditions and returns `Err(MissingReason)` when it
//! cannot produce a value; it never panics and never affects the others.

pub mod k002_mobility;
pub mod k003_open_space_share;
pub mod k004_urban_grain;
pub mod k005_noise_shielding;
pub mod k006_building_preservation;
pub mod k007_solar_share;
pub mod k008_open_space_diversity;
pub mod k009_water_access;
pub mod k010_unsealing;
pub mod k011_emergency_access;
pub mod k012_green_roof_share;
pub mod k013_tree_preservation;
pub mod k015_open_space_zoning;

#[cfg(test)]
pub(crate) mod fixtures;

pub use k002_mobility::calculate_k002;
pub use k003_open_space_share::calculate_k003;
pub use k004_urban_grain::calculate_k004;
pub use k005_noise_shielding::calculate_k005;
pub use k006_building_preservation::calculate_k006;
pub use k007_solar_share::calculate_k007;
pub use k008_open_space_diversity::calculate_k008;
pub use k009_water_access::calculate_k009;
pub use k010_unsealing::calculate_k010;
pub use k011_emergency_access::calculate_k011;
pub use k012_green_roof_share::calculate_k012;
pub use k013_tree_preservation::calculate_k013;
pub use k015_open_space_zoning::calculate_k015;

use crate::config::EngineConfig;
use crate::data::{Layer, LayerKind, LayerRepository};
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Criterion codes in classifier feature order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CriterionCode {
    K002,
    K003,
    K004,
    K005,
    K006,
    K007,
    K008,
    K009,
    K010,
    K011,
    K012,
    K013,
    K015,
}

impl CriterionCode {
    pub const ALL: [CriterionCode; 13] = [
        CriterionCode::K002,
        CriterionCode::K003,
        CriterionCode::K004,
        CriterionCode::K005,
        CriterionCode::K006,
        CriterionCode::K007,
        CriterionCode::K008,
        CriterionCode::K009,
        CriterionCode::K010,
        CriterionCode::K011,
        CriterionCode::K012,
        CriterionCode::K013,
        CriterionCode::K015,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CriterionCode::K002 => "K002",
            CriterionCode::K003 => "K003",
            CriterionCode::K004 => "K004",
            CriterionCode::K005 => "K005",
            CriterionCode::K006 => "K006",
            CriterionCode::K007 => "K007",
            CriterionCode::K008 => "K008",
            CriterionCode::K009 => "K009",
            CriterionCode::K010 => "K010",
            CriterionCode::K011 => "K011",
            CriterionCode::K012 => "K012",
            CriterionCode::K013 => "K013",
            CriterionCode::K015 => "K015",
        }
    }

    /// Human-readable criterion name
    pub fn title(self) -> &'static str {
        match self {
            CriterionCode::K002 => "zukunftsfähige Mobilität",
            CriterionCode::K003 => "Anteil der Freiflächen",
            CriterionCode::K004 => "Einbettung in die Umgebung",
            CriterionCode::K005 => "Lärmschutz",
            CriterionCode::K006 => "Erhalt Bestandsgebäude",
            CriterionCode::K007 => "Anteil PV-Anlagen",
            CriterionCode::K008 => "vielfältige Freiflächen",
            CriterionCode::K009 => "Zugang zum Wasser",
            CriterionCode::K010 => "Entsiegelung",
            CriterionCode::K011 => "Rettungswege",
            CriterionCode::K012 => "Anteil Dachbegrünung",
            CriterionCode::K013 => "Erhalt Baumbestand",
            CriterionCode::K015 => "Zonierung Freiflächen",
        }
    }

    /// Run the calculator for this criterion
    pub fn calculate(self, ctx: &CriterionContext<'_>) -> CriterionResult {
        match self {
            CriterionCode::K002 => calculate_k002(ctx),
            CriterionCode::K003 => calculate_k003(ctx),
            CriterionCode::K004 => calculate_k004(ctx),
            CriterionCode::K005 => calculate_k005(ctx),
            CriterionCode::K006 => calculate_k006(ctx),
            CriterionCode::K007 => calculate_k007(ctx),
            CriterionCode::K008 => calculate_k008(ctx),
            CriterionCode::K009 => calculate_k009(ctx),
            CriterionCode::K010 => calculate_k010(ctx),
            CriterionCode::K011 => calculate_k011(ctx),
            CriterionCode::K012 => calculate_k012(ctx),
            CriterionCode::K013 => calculate_k013(ctx),
            CriterionCode::K015 => calculate_k015(ctx),
        }
    }
}

impl fmt::Display for CriterionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CriterionCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Why a criterion could not be computed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MissingReason {
    #[error("layer {0} is absent")]
    LayerAbsent(LayerKind),

    #[error("layer {0} has no features")]
    LayerEmpty(LayerKind),

    #[error("none of the layers {0:?} is present")]
    NoneOfLayers(Vec<LayerKind>),

    #[error("layer {0} lacks attribute '{1}'")]
    AttributeAbsent(LayerKind, String),

    #[error("attribute '{1}' of layer {0} is unusable: {2}")]
    Attribute(LayerKind, String, String),

    #[error("site boundary area is undefined or not positive")]
    BasisUndefined,

    #[error("denominator is zero: {0}")]
    ZeroDenominator(&'static str),

    #[error("no usable data: {0}")]
    NoData(&'static str),
}

impl Serialize for MissingReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub type CriterionResult = Result<f64, MissingReason>;

/// Summed area of the site boundary, the denominator of the ratio criteria
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaBasis(Option<f64>);

impl AreaBasis {
    pub fn new(area: Option<f64>) -> Self {
        Self(area)
    }

    pub fn undefined() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    /// The basis when usable as a denominator
    pub fn positive(&self) -> Result<f64, MissingReason> {
        match self.0 {
            Some(area) if area.is_finite() && area > 0.0 => Ok(area),
            _ => Err(MissingReason::BasisUndefined),
        }
    }
}

/// Read-only inputs shared by all calculators of one run
pub struct CriterionContext<'a> {
    pub layers: &'a LayerRepository,
    pub area_basis: AreaBasis,
    pub config: &'a EngineConfig,
}

impl<'a> CriterionContext<'a> {
    pub fn new(layers: &'a LayerRepository, area_basis: AreaBasis, config: &'a EngineConfig) -> Self {
        Self {
            layers,
            area_basis,
            config,
        }
    }

    /// Layer that must be present
    pub fn require(&self, kind: LayerKind) -> Result<&'a Layer, MissingReason> {
        self.layers.get(kind).ok_or(MissingReason::LayerAbsent(kind))
    }

    /// Layer that must be present and hold at least one feature
    pub fn require_non_empty(&self, kind: LayerKind) -> Result<&'a Layer, MissingReason> {
        let layer = self.require(kind)?;
        if layer.is_empty() {
            return Err(MissingReason::LayerEmpty(kind));
        }
        Ok(layer)
    }

    pub fn optional(&self, kind: LayerKind) -> Option<&'a Layer> {
        self.layers.get(kind)
    }

    /// The present layers among `kinds`; an error if there are none
    pub fn require_any(&self, kinds: &[LayerKind]) -> Result<Vec<&'a Layer>, MissingReason> {
        let present: Vec<&Layer> = kinds.iter().filter_map(|&k| self.layers.get(k)).collect();
        if present.is_empty() {
            return Err(MissingReason::NoneOfLayers(kinds.to_vec()));
        }
        Ok(present)
    }
}

/// Value of one criterion in the feature record
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionValue {
    Value(f64),
    Missing(MissingReason),
}

impl CriterionValue {
    pub fn as_option(&self) -> Option<f64> {
        match self {
            CriterionValue::Value(v) => Some(*v),
            CriterionValue::Missing(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CriterionValue::Missing(_))
    }

    /// Numeric value with missing replaced by zero (classifier input)
    pub fn zero_filled(&self) -> f64 {
        self.as_option().unwrap_or(0.0)
    }
}

impl From<CriterionResult> for CriterionValue {
    fn from(result: CriterionResult) -> Self {
        match result {
            Ok(v) if v.is_finite() => CriterionValue::Value(v),
            Ok(_) => CriterionValue::Missing(MissingReason::NoData("non-finite result")),
            Err(reason) => CriterionValue::Missing(reason),
        }
    }
}

impl fmt::Display for CriterionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionValue::Value(v) => write!(f, "{}", v),
            CriterionValue::Missing(_) => f.write_str("missing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirteen_codes_in_feature_order() {
        let names: Vec<&str> = CriterionCode::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec!["K002", "K003", "K004", "K005", "K006", "K007", "K008", "K009", "K010", "K011", "K012", "K013", "K015"]
        );
    }

    #[test]
    fn test_area_basis_positive() {
        assert_eq!(AreaBasis::new(Some(1000.0)).positive(), Ok(1000.0));
        assert_eq!(AreaBasis::new(Some(0.0)).positive(), Err(MissingReason::BasisUndefined));
        assert_eq!(AreaBasis::undefined().positive(), Err(MissingReason::BasisUndefined));
        assert_eq!(AreaBasis::new(Some(f64::NAN)).positive(), Err(MissingReason::BasisUndefined));
    }

    #[test]
    fn test_non_finite_result_becomes_missing() {
        let value = CriterionValue::from(Ok(f64::INFINITY));
        assert!(value.is_missing());
        assert_eq!(value.zero_filled(), 0.0);
    }
}

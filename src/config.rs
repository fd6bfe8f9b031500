//! Engine configuration
//!
//! All distances are in the linear unit of the reference CRS (metres for the
//! projected systems proposals are normally delivered in). Areas are in
//! square units of the same CRS.
//!
//! The defaults reproduce the canonical scoring rubric; a JSON file can
//! override any subset of fields.

use crate::error::EngineError;
use crate::utils::crs::Crs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How K010 behaves when the existing-green baseline layer is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// No baseline means no measurable improvement: K010 = 0.0
    ZeroFill,
    /// Use the new-green share of the site as a positive proxy
    NewGreenProxy,
}

/// Traffic-area use categories (values of `Verkehrsflaechen.Nutzung`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrafficUses {
    pub pedestrian: Vec<String>,
    pub motor_vehicle: Vec<String>,
    pub shared: Vec<String>,
    /// Categories treated as motor traffic for noise shielding (K005)
    pub noise_sources: Vec<String>,
}

impl Default for TrafficUses {
    fn default() -> Self {
        Self {
            pedestrian: vec!["Fuss_Rad".to_string()],
            motor_vehicle: vec!["Kfz_Flaeche".to_string()],
            shared: vec!["Begegnungszone".to_string()],
            noise_sources: vec!["Kfz_Flaeche".to_string(), "Auto_Fuss_Rad".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// CRS assumed when neither the centerline nor the boundary layer carries one
    pub default_crs: String,
    /// File name of the one-row criteria table written into the input root
    pub output_file: String,
    /// File name of the JSON diagnostics report written next to it
    pub report_file: String,
    /// Overlap areas at or below this are numeric noise (shared edges)
    pub overlap_noise_threshold: f64,
    pub noise_buffer: f64,
    pub context_buffer: f64,
    pub water_access_buffer: f64,
    pub corridor_half_width: f64,
    pub tree_match_distance: f64,
    pub baseline_policy: BaselinePolicy,
    pub traffic_uses: TrafficUses,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_crs: "EPSG:25832".to_string(),
            output_file: "Kriterien_Ergebnisse.csv".to_string(),
            report_file: "Kriterien_Bericht.json".to_string(),
            overlap_noise_threshold: 1e-3,
            noise_buffer: 10.0,
            context_buffer: 0.20,
            water_access_buffer: 2.0,
            corridor_half_width: 1.5,
            tree_match_distance: 1.0,
            baseline_policy: BaselinePolicy::ZeroFill,
            traffic_uses: TrafficUses::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file, falling back to defaults for
    /// every field the file leaves out
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no calculator can work with
    pub fn validate(&self) -> Result<(), EngineError> {
        let distances = [
            ("overlap_noise_threshold", self.overlap_noise_threshold),
            ("noise_buffer", self.noise_buffer),
            ("context_buffer", self.context_buffer),
            ("water_access_buffer", self.water_access_buffer),
            ("corridor_half_width", self.corridor_half_width),
            ("tree_match_distance", self.tree_match_distance),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.output_file.trim().is_empty() {
            return Err(EngineError::Config("output_file must not be empty".to_string()));
        }
        if self.report_file.trim().is_empty() {
            return Err(EngineError::Config("report_file must not be empty".to_string()));
        }

        Crs::parse(&self.default_crs)
            .ok_or_else(|| EngineError::Config(format!("unsupported default_crs '{}'", self.default_crs)))?;

        Ok(())
    }

    /// Parsed form of `default_crs`
    pub fn default_crs(&self) -> Crs {
        Crs::parse(&self.default_crs).unwrap_or(Crs::Epsg(25832))
    }
}

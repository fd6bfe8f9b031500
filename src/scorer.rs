//! Proposal Scorer - main coordinator for scoring one urban-design proposal
//!
//! **Run order** (all sequential, one proposal per call):
//!   1. open the layer repository for the proposal root
//!   2. pick the reference CRS once and reproject every layer into it
//!   3. compute the area basis from the site boundary
//!   4. run the 13 calculators against the shared read-only layers
//!   5. hand the values to the aggregator (`output`)
//!
//! Several proposals can be scored in parallel with `score_batch`; they share
//! nothing but the configuration.

use crate::config::EngineConfig;
use crate::data::{LayerKind, LayerRepository};
use crate::metrics::{AreaBasis, CriterionCode, CriterionContext, CriterionValue};
use crate::output::{FeatureRecord, ScoreReport};
use crate::utils::crs::Crs;
use crate::utils::geometry::layer_area;
use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reference CRS: centerlines, then site boundary, then the configured default
pub fn reference_crs(layers: &LayerRepository, default: &Crs) -> Crs {
    [LayerKind::TrafficCenterlines, LayerKind::SiteBoundary]
        .into_iter()
        .filter_map(|kind| layers.get(kind).and_then(|layer| layer.crs()))
        .next()
        .cloned()
        .unwrap_or_else(|| default.clone())
}

/// Summed site-boundary area; undefined when the layer is absent
pub fn area_basis(layers: &LayerRepository) -> AreaBasis {
    AreaBasis::new(layers.get(LayerKind::SiteBoundary).map(layer_area))
}

/// Main proposal scorer
pub struct ProposalScorer {
    config: EngineConfig,
}

/// Everything one run produced
#[derive(Debug)]
pub struct ProposalScore {
    pub record: FeatureRecord,
    pub absent_layers: Vec<LayerKind>,
    pub reference_crs: Crs,
    pub area_basis: AreaBasis,
}

impl ProposalScore {
    pub fn report(&self) -> ScoreReport<'_> {
        ScoreReport::new(self)
    }
}

impl ProposalScorer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load, align and score the proposal below `root`
    pub fn score_directory(&self, root: &Path) -> Result<ProposalScore> {
        info!(root = ?root, "scoring proposal");
        let mut layers = LayerRepository::open(root)?;

        let absent_layers = layers.absent();
        if !absent_layers.is_empty() {
            let names: Vec<&str> = absent_layers.iter().map(|k| k.file_stem()).collect();
            warn!(absent = ?names, "layers not present in proposal");
        }

        let reference = reference_crs(&layers, &self.config.default_crs());
        layers.align_to(&reference);

        let area_basis = area_basis(&layers);
        let record = self.score_layers(&layers, area_basis);

        Ok(ProposalScore {
            record,
            absent_layers,
            reference_crs: reference,
            area_basis,
        })
    }

    /// Run all calculators over already aligned layers
    pub fn score_layers(&self, layers: &LayerRepository, area_basis: AreaBasis) -> FeatureRecord {
        let ctx = CriterionContext::new(layers, area_basis, &self.config);

        let values = CriterionCode::ALL.map(|code| {
            let value = CriterionValue::from(code.calculate(&ctx));
            if let CriterionValue::Missing(reason) = &value {
                warn!(criterion = %code, title = code.title(), "criterion could not be computed: {}", reason);
            }
            value
        });

        FeatureRecord::new(values)
    }

    /// Score the proposal and write its artifacts into `root`
    pub fn score_and_write(&self, root: &Path, write_report: bool) -> Result<ProposalScore> {
        let score = self.score_directory(root)?;

        let output_path = root.join(&self.config.output_file);
        score.record.write_csv(&output_path)?;
        info!(path = ?output_path, "criteria table written");

        if write_report {
            let report_path = root.join(&self.config.report_file);
            score.report().write_json(&report_path)?;
            info!(path = ?report_path, "diagnostics report written");
        }

        Ok(score)
    }
}

/// Score several proposal directories in parallel, each in isolation
pub fn score_batch(
    roots: &[PathBuf],
    config: &EngineConfig,
    write_report: bool,
) -> Vec<(PathBuf, Result<ProposalScore>)> {
    roots
        .par_iter()
        .map(|root| {
            let scorer = ProposalScorer::new(config.clone());
            (root.clone(), scorer.score_and_write(root, write_report))
        })
        .collect()
}

//! Result Aggregator
//!
//! Collects the 13 calculator outputs into one record in classifier feature
//! order and writes it out:
//!   - `write_csv`: one-row table, 13 named columns, missing = empty cell
//!   - `ScoreReport::write_json`: values plus reasons and run diagnostics
//!   - `Display`: human-readable summary, one line per criterion
//!
//! Serialization is deterministic: identical inputs give identical bytes.

use crate::data::LayerKind;
use crate::error::EngineError;
use crate::metrics::{CriterionCode, CriterionValue, MissingReason};
use crate::scorer::ProposalScore;
use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// The ordered feature vector of one proposal
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: [CriterionValue; 13],
}

impl FeatureRecord {
    /// Values must follow `CriterionCode::ALL`
    pub fn new(values: [CriterionValue; 13]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[CriterionValue; 13] {
        &self.values
    }

    pub fn get(&self, code: CriterionCode) -> &CriterionValue {
        let idx = CriterionCode::ALL
            .iter()
            .position(|c| *c == code)
            .unwrap_or_default();
        &self.values[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CriterionCode, &CriterionValue)> + '_ {
        CriterionCode::ALL.into_iter().zip(self.values.iter())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// One-row table with a nullable Float64 column per criterion
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .iter()
            .map(|(code, value)| Column::from(Series::new(code.as_str().into(), &[value.as_option()])))
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    /// Write the criteria table consumed by the classifier
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path).map_err(|source| EngineError::Output {
            path: path.to_path_buf(),
            source,
        })?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .with_context(|| format!("Failed to write criteria table: {:?}", path))?;
        Ok(())
    }
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kriterienbewertung")?;
        writeln!(f, "{}", "=".repeat(50))?;
        for (code, value) in self.iter() {
            match value {
                CriterionValue::Value(v) => writeln!(f, "{}  {:<28} {:>8}", code, code.title(), v)?,
                CriterionValue::Missing(reason) => {
                    writeln!(f, "{}  {:<28} {:>8}  ({})", code, code.title(), "-", reason)?
                }
            }
        }
        write!(f, "{} of 13 criteria missing", self.missing_count())
    }
}

#[derive(Debug, Serialize)]
struct CriterionEntry<'a> {
    code: CriterionCode,
    title: &'static str,
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_reason: Option<&'a MissingReason>,
}

/// JSON diagnostics for one run
#[derive(Debug, Serialize)]
pub struct ScoreReport<'a> {
    criteria: Vec<CriterionEntry<'a>>,
    absent_layers: Vec<&'static str>,
    reference_crs: String,
    site_area: Option<f64>,
}

impl<'a> ScoreReport<'a> {
    pub fn new(score: &'a ProposalScore) -> Self {
        let criteria = score
            .record
            .iter()
            .map(|(code, value)| CriterionEntry {
                code,
                title: code.title(),
                value: value.as_option(),
                missing_reason: match value {
                    CriterionValue::Missing(reason) => Some(reason),
                    CriterionValue::Value(_) => None,
                },
            })
            .collect();

        Self {
            criteria,
            absent_layers: score.absent_layers.iter().map(|k| LayerKind::file_stem(*k)).collect(),
            reference_crs: score.reference_crs.to_string(),
            site_area: score.area_basis.value(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path).map_err(|source| EngineError::Output {
            path: path.to_path_buf(),
            source,
        })?;
        file.write_all(json.as_bytes())
            .map_err(|source| EngineError::Output {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }
}

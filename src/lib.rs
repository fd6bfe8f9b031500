//! Design Scorer Rust Implementation
//!
//! Scores an urban-design proposal, delivered as a directory of shapefile
//! layers, against 13 quantitative criteria (K002-K013, K015) and writes
//! the resulting feature record for a downstream classifier.
//!
//! Structure:
//! - `data/`: Layer discovery, shapefile loading, CRS alignment
//! - `utils/`: Geometry, attribute and CRS helpers shared by the criteria
//! - `metrics/`: One calculator per criterion
//! - `scorer`: Run coordination, single and batch
//! - `output`: Feature record, criteria table and JSON report

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod output;
pub mod scorer;
pub mod utils;

// Re-export commonly used types
pub use config::{BaselinePolicy, EngineConfig, TrafficUses};
pub use data::{Layer, LayerKind, LayerRepository};
pub use error::EngineError;
pub use metrics::{AreaBasis, CriterionCode, CriterionValue, MissingReason};
pub use output::{FeatureRecord, ScoreReport};
pub use scorer::{score_batch, ProposalScore, ProposalScorer};

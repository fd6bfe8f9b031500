//! Utility modules for proposal scoring
//!
//! Contains shared functionality used across multiple criteria:
//! - Geometry: repair, unions, buffers, overlap tests
//! - Attributes: typed column access with missing-value handling
//! - CRS: identification from .prj files and reprojection

pub mod attributes;
pub mod crs;
pub mod geometry;

// Re-export commonly used types
pub use crs::{Crs, Reprojector};
pub use geometry::{layer_area, repair, round2};

//! Fatal engine errors
//!
//! Everything listed here aborts the run for one proposal. Per-criterion
//! problems never end up here; they are `MissingReason`s in `metrics`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input root {0:?} does not exist or is not a directory")]
    InputRoot(PathBuf),

    #[error("input root {path:?} could not be scanned")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("output artifact {path:?} could not be written")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

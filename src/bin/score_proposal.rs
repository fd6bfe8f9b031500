//! Score one urban-design proposal
//!
//! Usage: score_proposal [ROOT] [--config engine.json] [--no-report]
//!
//! Writes the criteria table (and, unless disabled, the JSON report) into
//! ROOT and prints a summary to stdout. Logs go to stderr; set RUST_LOG to
//! change verbosity.

use anyhow::Result;
use clap::Parser;
use design_scorer_rust::{EngineConfig, ProposalScorer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "score_proposal", version, about = "Score an urban-design proposal")]
struct Args {
    /// Directory containing the proposal's shapefile layers
    #[arg(default_value = "./Project_shp")]
    root: PathBuf,

    /// JSON file overriding the engine defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the JSON diagnostics report
    #[arg(long, default_value_t = false)]
    no_report: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "design_scorer_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    tracing::info!(root = ?args.root, crs = %config.default_crs, "configuration loaded");

    let scorer = ProposalScorer::new(config);
    let score = scorer.score_and_write(&args.root, !args.no_report)?;

    println!("{}", score.record);
    println!();
    println!("Reference CRS: {}", score.reference_crs);
    match score.area_basis.value() {
        Some(area) => println!("Site area:     {:.2} m²", area),
        None => println!("Site area:     undefined"),
    }
    println!(
        "Output:        {}",
        args.root.join(&scorer.config().output_file).display()
    );

    Ok(())
}

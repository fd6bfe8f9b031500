//! Score every proposal below a parent directory in parallel
//!
//! Each immediate subdirectory is one proposal. Failures are reported per
//! proposal; the exit status is non-zero if any proposal failed.

use anyhow::{Context, Result};
use clap::Parser;
use design_scorer_rust::{score_batch, EngineConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "score_batch", version, about = "Score a directory of proposals")]
struct Args {
    /// Directory whose subdirectories are proposals
    parent: PathBuf,

    /// JSON file overriding the engine defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the JSON diagnostics reports
    #[arg(long, default_value_t = false)]
    no_report: bool,

    /// Worker threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "design_scorer_rust=warn,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let mut roots: Vec<PathBuf> = std::fs::read_dir(&args.parent)
        .with_context(|| format!("Failed to list proposals in {:?}", args.parent))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    roots.sort();

    println!("Scoring {} proposals...\n", roots.len());
    let start = Instant::now();
    let results = score_batch(&roots, &config, !args.no_report);
    let elapsed = start.elapsed();

    let mut failed = 0usize;
    for (root, result) in &results {
        let name = root.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        match result {
            Ok(score) => println!(
                "{:<40} {:>2}/13 criteria computed",
                name,
                13 - score.record.missing_count()
            ),
            Err(e) => {
                failed += 1;
                println!("{:<40} FAILED: {:#}", name, e);
            }
        }
    }

    println!("\nDone in {:.2?} ({} failed)", elapsed, failed);
    if failed > 0 {
        anyhow::bail!("{} of {} proposals failed", failed, results.len());
    }
    Ok(())
}

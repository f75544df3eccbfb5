//! `crashdb`: build the normalised accident store and its schema summary.
//!
//! # Usage
//!
//! ```text
//! crashdb build --source data/US_Accidents_March23.csv --fraction 0.02
//! crashdb build --incremental --null-safe
//! crashdb summary --out data/data_schema.json
//! ```
//!
//! Settings come from `crashdb.toml` (or `--config`), then `CRASHDB_*`
//! environment variables, then command-line flags.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use crashdb_core::report::NullKeyPolicy;
use crashdb_etl::PipelineConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crashdb", version, about = "Normalise accident records into a 3NF SQLite store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "crashdb.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Extract the source and rebuild (or extend) the store.
  Build {
    /// Source CSV file.
    #[arg(long)]
    source: Option<PathBuf>,

    /// SQLite store file.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Fraction of source rows to keep, in (0, 1].
    #[arg(long)]
    fraction: Option<f64>,

    /// Seed for row sampling.
    #[arg(long)]
    seed: Option<u64>,

    /// Keep the existing schema and dimensions and append facts.
    #[arg(long)]
    incremental: bool,

    /// Let NULL natural-key attributes match instead of dropping the row.
    #[arg(long)]
    null_safe: bool,
  },

  /// Write min/max/mean/median and value counts for the feature columns.
  Summary {
    /// SQLite store file.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Output JSON file.
    #[arg(long)]
    out: Option<PathBuf>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut config = PipelineConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  match cli.command {
    Command::Build { source, store, fraction, seed, incremental, null_safe } => {
      if let Some(source) = source {
        config.source_path = source;
      }
      if let Some(store) = store {
        config.store_path = store;
      }
      if let Some(fraction) = fraction {
        config.sample_fraction = fraction;
      }
      if let Some(seed) = seed {
        config.seed = seed;
      }
      if incremental {
        config.full_reset = false;
      }
      if null_safe {
        config.null_policy = NullKeyPolicy::NullSafe;
      }

      let report = crashdb_etl::run_build(&config)
        .await
        .with_context(|| format!("build of {:?} failed", config.store_path))?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Command::Summary { store, out } => {
      if let Some(store) = store {
        config.store_path = store;
      }
      if let Some(out) = out {
        config.summary_path = out;
      }

      crashdb_etl::write_summary(&config)
        .await
        .context("failed to write schema summary")?;
    }
  }

  Ok(())
}

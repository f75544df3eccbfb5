//! Pipeline configuration, deserialised from `crashdb.toml` and the
//! environment.

use std::path::{Path, PathBuf};

use crashdb_core::report::{BuildMode, BuildOptions, NullKeyPolicy};
use crashdb_source::ExtractOptions;
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// The wide accident CSV.
  pub source_path:     PathBuf,
  /// SQLite file holding staging, dimension and fact tables.
  pub store_path:      PathBuf,
  /// Where `summary` writes its JSON.
  pub summary_path:    PathBuf,
  pub sample_fraction: f64,
  pub seed:            u64,
  /// Drop and rebuild everything (`true`) or append to the existing store.
  pub full_reset:      bool,
  pub null_policy:     NullKeyPolicy,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    let extract = ExtractOptions::default();
    Self {
      source_path:     PathBuf::from("data/US_Accidents_March23.csv"),
      store_path:      PathBuf::from("data/accidents.db"),
      summary_path:    PathBuf::from("data/data_schema.json"),
      sample_fraction: extract.sample_fraction,
      seed:            extract.seed,
      full_reset:      true,
      null_policy:     NullKeyPolicy::default(),
    }
  }
}

impl PipelineConfig {
  /// Layer an optional TOML file and `CRASHDB_*` environment variables over
  /// the defaults. A missing file is not an error.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("CRASHDB"))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn extract_options(&self) -> ExtractOptions {
    ExtractOptions { sample_fraction: self.sample_fraction, seed: self.seed }
  }

  pub fn build_options(&self) -> BuildOptions {
    BuildOptions {
      mode:        if self.full_reset { BuildMode::Full } else { BuildMode::Incremental },
      null_policy: self.null_policy,
    }
  }
}

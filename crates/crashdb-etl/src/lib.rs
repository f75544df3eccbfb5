//! The crashdb pipeline: extract the flat accident source, normalise it into
//! the SQLite store, and derive the schema summary from the result.
//!
//! Extraction runs before the store is touched, so a missing or malformed
//! source never disturbs an existing build.

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::PipelineConfig;

use std::path::Path;

use crashdb_core::{
  record::AccidentRecord,
  report::{BuildOptions, BuildReport},
  store::AccidentStore,
  summary::SchemaSummary,
};
use crashdb_store_sqlite::SqliteStore;
use tracing::info;

/// Extract, open the store and build.
pub async fn run_build(config: &PipelineConfig) -> Result<BuildReport> {
  let records = crashdb_source::extract(&config.source_path, &config.extract_options())?;

  ensure_parent(&config.store_path)?;
  let store = SqliteStore::open(&config.store_path).await?;
  Ok(build(&store, records, config.build_options()).await?)
}

/// Normalise `records` into any [`AccidentStore`].
pub async fn build<S: AccidentStore>(
  store:   &S,
  records: Vec<AccidentRecord>,
  options: BuildOptions,
) -> Result<BuildReport, S::Error> {
  info!(
    rows = records.len(),
    mode = %options.mode,
    null_policy = %options.null_policy,
    "starting build"
  );
  let report = store.build(records, options).await?;
  info!(
    build_id = %report.build_id,
    staged = report.staged_rows,
    facts = report.facts_inserted,
    dropped = report.facts_dropped,
    "build finished"
  );
  Ok(report)
}

/// Read the feature rows out of an existing store and write their summary
/// as pretty-printed JSON to `config.summary_path`.
pub async fn write_summary(config: &PipelineConfig) -> Result<SchemaSummary> {
  if !config.store_path.exists() {
    return Err(Error::StoreNotFound(config.store_path.clone()));
  }
  let store = SqliteStore::open(&config.store_path).await?;
  let rows = store.feature_rows().await?;
  let summary = SchemaSummary::from_rows(&rows);

  ensure_parent(&config.summary_path)?;
  std::fs::write(&config.summary_path, serde_json::to_string_pretty(&summary)?)?;
  info!(rows = rows.len(), path = %config.summary_path.display(), "summary written");
  Ok(summary)
}

fn ensure_parent(path: &Path) -> Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  Ok(())
}

//! Error type for `crashdb-etl`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("extract failed: {0}")]
  Source(#[from] crashdb_source::Error),

  #[error("store failed: {0}")]
  Store(#[from] crashdb_store_sqlite::Error),

  #[error("no store at {}; run a build first", .0.display())]
  StoreNotFound(PathBuf),

  #[error("config error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

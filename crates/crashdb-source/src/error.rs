//! Error types for the crashdb source extractor.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("source not found: {}", .0.display())]
  SourceNotFound(PathBuf),

  #[error("source is missing expected columns: {}", .missing.join(", "))]
  SchemaMismatch { missing: Vec<String> },

  #[error("sample fraction must be in (0, 1], got {0}")]
  InvalidFraction(f64),

  #[error("line {line}: invalid value for {column}: {value:?}")]
  InvalidValue { line: u64, column: &'static str, value: String },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

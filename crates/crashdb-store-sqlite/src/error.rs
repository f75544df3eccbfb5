//! Error type for `crashdb-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The connection thread failed or a read query failed.
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A statement inside a build transaction failed; the build was rolled
  /// back.
  #[error("write error: {0}")]
  Write(#[from] rusqlite::Error),

  /// An existing table does not have the shape this store declares. Tables
  /// are never migrated automatically; a full reset replaces them.
  #[error("table {table} is incompatible, missing columns: {}", .missing.join(", "))]
  Schema { table: String, missing: Vec<String> },

  /// Declaring or inspecting a table failed, for example because another
  /// schema object already holds its name.
  #[error("cannot declare table {table}: {source}")]
  Declare {
    table:  String,
    #[source]
    source: rusqlite::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

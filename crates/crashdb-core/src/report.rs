//! Build options and the report a build returns.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dimension::Dimension;

// ─── Options ─────────────────────────────────────────────────────────────────

/// How a build treats what is already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
  /// Drop every table and rebuild from scratch.
  #[default]
  Full,
  /// Keep schema and dimension rows; append facts for the new staging data.
  Incremental,
}

impl fmt::Display for BuildMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      BuildMode::Full => "full",
      BuildMode::Incremental => "incremental",
    })
  }
}

/// What to do with a staging row whose natural key has a NULL attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullKeyPolicy {
  /// SQL equality semantics: NULL never matches, so the row yields no fact.
  /// NULL-bearing tuples are not materialised as dimension rows.
  #[default]
  Drop,
  /// NULL matches NULL: NULL-bearing tuples become ordinary dimension rows
  /// and every staging row yields a fact.
  NullSafe,
}

impl fmt::Display for NullKeyPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      NullKeyPolicy::Drop => "drop",
      NullKeyPolicy::NullSafe => "null-safe",
    })
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
  pub mode:        BuildMode,
  pub null_policy: NullKeyPolicy,
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Per-dimension outcome of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionStats {
  /// Rows added by this build.
  pub inserted:     u64,
  /// Rows in the table after the build.
  pub total:        u64,
  /// Distinct staging tuples not materialised because they contain a NULL.
  pub null_skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
  pub build_id:       Uuid,
  pub options:        BuildOptions,
  pub staged_rows:    u64,
  pub dimensions:     BTreeMap<Dimension, DimensionStats>,
  pub facts_inserted: u64,
  /// Staging rows that resolved no surrogate key for at least one dimension.
  pub facts_dropped:  u64,
}

impl BuildReport {
  pub fn new(build_id: Uuid, options: BuildOptions) -> Self {
    Self {
      build_id,
      options,
      staged_rows: 0,
      dimensions: BTreeMap::new(),
      facts_inserted: 0,
      facts_dropped: 0,
    }
  }
}

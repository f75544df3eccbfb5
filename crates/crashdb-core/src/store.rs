//! The `AccidentStore` trait.
//!
//! Implemented by storage backends (e.g. `crashdb-store-sqlite`). The
//! pipeline depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  dimension::{Dimension, NaturalKey},
  features::FeatureRow,
  record::AccidentRecord,
  report::{BuildOptions, BuildReport},
};

/// Abstraction over a normalised accident store.
///
/// A store has exactly one writer. `build` either completes and leaves the
/// new state visible, or fails and leaves the previous state untouched.
pub trait AccidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Replace the staging relation with `records`, then normalise it into the
  /// fact and dimension tables according to `options`.
  fn build(
    &self,
    records: Vec<AccidentRecord>,
    options: BuildOptions,
  ) -> impl Future<Output = Result<BuildReport, Self::Error>> + Send + '_;

  /// One feature row per fact with a non-null severity, joined back through
  /// the surrogate keys.
  fn feature_rows(
    &self,
  ) -> impl Future<Output = Result<Vec<FeatureRow>, Self::Error>> + Send + '_;

  /// Every natural key currently stored for `dimension`.
  fn dimension_keys(
    &self,
    dimension: Dimension,
  ) -> impl Future<Output = Result<Vec<NaturalKey>, Self::Error>> + Send + '_;

  /// Number of rows in the fact table.
  fn fact_count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

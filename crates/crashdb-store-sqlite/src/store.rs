//! [`SqliteStore`], the SQLite implementation of [`AccidentStore`].

use std::path::Path;

use crashdb_core::{
  dimension::{Dimension, NaturalKey},
  features::{CalendarFeatures, FeatureRow},
  record::AccidentRecord,
  report::{BuildOptions, BuildReport},
  store::AccidentStore,
};
use tracing::info;
use uuid::Uuid;

use crate::{
  Result, build,
  encode::read_key,
  schema::{FACT_TABLE, PRAGMAS, create_schema},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A normalised accident store backed by a single SQLite file.
///
/// Clones share one reference-counted connection, so builds through any clone
/// are serialised.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and declare the schema.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    info!(path = %path.display(), "store opened");
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Apply pragmas and declare any absent tables. Existing tables are left
  /// as they are; their shape is checked when a build runs.
  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(create_schema(conn))
      })
      .await?
  }

  /// Number of rows in an arbitrary table; used by tests and diagnostics.
  pub async fn row_count(&self, table: &'static str) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(count as u64)
  }
}

// ─── AccidentStore impl ──────────────────────────────────────────────────────

impl AccidentStore for SqliteStore {
  type Error = crate::Error;

  async fn build(
    &self,
    records: Vec<AccidentRecord>,
    options: BuildOptions,
  ) -> Result<BuildReport> {
    let build_id = Uuid::new_v4();
    self
      .conn
      .call(move |conn| Ok(build::run(conn, &records, options, build_id)))
      .await?
  }

  async fn feature_rows(&self) -> Result<Vec<FeatureRow>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             a.severity, a.start_time,
             l.state, l.latitude, l.longitude,
             w.temperature_f, w.visibility_mi, w.wind_speed_mph,
             w.precipitation_in, w.weather_condition,
             r.junction, r.traffic_signal, r.crossing, r.stop,
             r.railway, r.roundabout, r.bump,
             m.amenity, m.give_way, m.no_exit, m.station,
             m.traffic_calming, m.turning_loop
           FROM accidents a
           JOIN locations           l ON a.location_id            = l.location_id
           JOIN weather_conditions  w ON a.weather_id             = w.weather_id
           JOIN road_features       r ON a.road_features_id       = r.road_features_id
           JOIN minor_road_features m ON a.minor_road_features_id = m.minor_road_features_id
           WHERE a.severity IS NOT NULL
           ORDER BY a.accident_id",
        )?;

        let rows = stmt
          .query_map([], |row| {
            let start_time: Option<String> = row.get(1)?;
            Ok(FeatureRow {
              severity:          row.get(0)?,
              calendar:          CalendarFeatures::from_start_time(start_time.as_deref()),
              state:             row.get(2)?,
              latitude:          row.get(3)?,
              longitude:         row.get(4)?,
              temperature_f:     row.get(5)?,
              visibility_mi:     row.get(6)?,
              wind_speed_mph:    row.get(7)?,
              precipitation_in:  row.get(8)?,
              weather_condition: row.get(9)?,
              junction:          row.get(10)?,
              traffic_signal:    row.get(11)?,
              crossing:          row.get(12)?,
              stop:              row.get(13)?,
              railway:           row.get(14)?,
              roundabout:        row.get(15)?,
              bump:              row.get(16)?,
              amenity:           row.get(17)?,
              give_way:          row.get(18)?,
              no_exit:           row.get(19)?,
              station:           row.get(20)?,
              traffic_calming:   row.get(21)?,
              turning_loop:      row.get(22)?,
              ..Default::default()
            }
            .with_counts())
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn dimension_keys(&self, dimension: Dimension) -> Result<Vec<NaturalKey>> {
    let spec = dimension.spec();
    let keys = self
      .conn
      .call(move |conn| {
        let names: Vec<&str> = spec.columns.iter().map(|c| c.name).collect();
        let sql = format!("SELECT {} FROM {} ORDER BY {}", names.join(", "), spec.table, spec.id);
        let mut stmt = conn.prepare(&sql)?;
        let keys = stmt
          .query_map([], |row| read_key(row, 0, spec.columns.len()))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }

  async fn fact_count(&self) -> Result<u64> { self.row_count(FACT_TABLE).await }
}

//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use crashdb_core::{
  dimension::{Dimension, NaturalKey},
  record::AccidentRecord,
  report::{BuildMode, BuildOptions, NullKeyPolicy},
  store::AccidentStore,
};
use strum::IntoEnumIterator;

use crate::{Error, STAGING_TABLE, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

const FULL: BuildOptions = BuildOptions { mode: BuildMode::Full, null_policy: NullKeyPolicy::Drop };

const INCREMENTAL: BuildOptions =
  BuildOptions { mode: BuildMode::Incremental, null_policy: NullKeyPolicy::Drop };

fn accident(county: Option<&str>, weather: &str, temperature: f64) -> AccidentRecord {
  AccidentRecord {
    accident_id:       Some("A-1".into()),
    severity:          Some(2),
    start_time:        Some("2016-02-06 22:15:00".into()),
    end_time:          Some("2016-02-06 23:00:00".into()),
    state:             Some("CA".into()),
    county:            county.map(Into::into),
    city:              Some("Los Angeles".into()),
    start_lat:         Some(34.0),
    start_lng:         Some(-118.0),
    temperature_f:     Some(temperature),
    visibility_mi:     Some(10.0),
    wind_speed_mph:    Some(5.0),
    precipitation_in:  Some(0.0),
    weather_condition: Some(weather.into()),
    junction:          Some(false),
    traffic_signal:    Some(true),
    crossing:          Some(false),
    stop:              Some(false),
    railway:           Some(false),
    roundabout:        Some(false),
    bump:              Some(false),
    amenity:           Some(false),
    give_way:          Some(false),
    no_exit:           Some(false),
    station:           Some(false),
    traffic_calming:   Some(false),
    turning_loop:      Some(false),
    description:       Some("Crash on I-5".into()),
  }
}

/// Two rows at the same place in different weather, one row with no county.
fn scenario() -> Vec<AccidentRecord> {
  vec![
    accident(Some("Los Angeles"), "Clear", 60.0),
    accident(Some("Los Angeles"), "Rain", 55.0),
    accident(None, "Clear", 60.0),
  ]
}

fn clean_batch() -> Vec<AccidentRecord> {
  (0..20)
    .map(|i| {
      let mut r = accident(Some("Los Angeles"), if i % 2 == 0 { "Clear" } else { "Fog" }, 50.0);
      r.start_lat = Some(34.0 + f64::from(i % 5) / 100.0);
      r.junction = Some(i % 3 == 0);
      r
    })
    .collect()
}

async fn key_set(s: &SqliteStore, dim: Dimension) -> HashSet<NaturalKey> {
  s.dimension_keys(dim).await.unwrap().into_iter().collect()
}

async fn assert_unique(s: &SqliteStore) {
  for dim in Dimension::iter() {
    let keys = s.dimension_keys(dim).await.unwrap();
    let distinct: HashSet<_> = keys.iter().collect();
    assert_eq!(distinct.len(), keys.len(), "duplicate natural key in {dim}");
  }
}

// ─── Scenario ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn null_county_row_is_dropped() {
  let s = store().await;
  let report = s.build(scenario(), FULL).await.unwrap();

  assert_eq!(report.staged_rows, 3);
  assert_eq!(s.dimension_keys(Dimension::Location).await.unwrap().len(), 1);
  assert_eq!(s.dimension_keys(Dimension::Weather).await.unwrap().len(), 2);
  assert_eq!(s.fact_count().await.unwrap(), 2);

  assert_eq!(report.facts_inserted, 2);
  assert_eq!(report.facts_dropped, 1);
  assert_eq!(report.dimensions[&Dimension::Location].null_skipped, 1);
  assert_eq!(report.dimensions[&Dimension::Location].total, 1);
}

#[tokio::test]
async fn staging_keeps_every_extracted_row() {
  let s = store().await;
  s.build(scenario(), FULL).await.unwrap();
  assert_eq!(s.row_count(STAGING_TABLE).await.unwrap(), 3);

  s.build(vec![accident(Some("Orange"), "Snow", 20.0)], INCREMENTAL)
    .await
    .unwrap();
  assert_eq!(s.row_count(STAGING_TABLE).await.unwrap(), 1, "staging is replaced, not appended");
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn clean_rows_produce_exactly_one_fact_each() {
  let s = store().await;
  let batch = clean_batch();
  let report = s.build(batch.clone(), FULL).await.unwrap();

  assert_eq!(report.facts_inserted, batch.len() as u64);
  assert_eq!(report.facts_dropped, 0);
  assert_eq!(s.fact_count().await.unwrap(), batch.len() as u64);

  // Every staging tuple is in its dimension.
  for dim in Dimension::iter() {
    let stored = key_set(&s, dim).await;
    for record in &batch {
      assert!(stored.contains(&record.natural_key(dim)), "{dim} is missing a staging tuple");
    }
  }

  // Joining back through the surrogate keys loses nothing.
  assert_eq!(s.feature_rows().await.unwrap().len(), batch.len());
}

#[tokio::test]
async fn dimension_population_is_idempotent() {
  let s = store().await;
  s.build(clean_batch(), FULL).await.unwrap();
  let before: Vec<_> = {
    let mut v = Vec::new();
    for dim in Dimension::iter() {
      v.push(s.dimension_keys(dim).await.unwrap());
    }
    v
  };

  let report = s.build(clean_batch(), INCREMENTAL).await.unwrap();
  assert!(report.dimensions.values().all(|d| d.inserted == 0));

  for (dim, keys) in Dimension::iter().zip(before) {
    assert_eq!(s.dimension_keys(dim).await.unwrap(), keys, "{dim} changed on re-run");
  }
  assert_unique(&s).await;
}

#[tokio::test]
async fn incremental_rerun_appends_facts() {
  let s = store().await;
  let batch = clean_batch();
  s.build(batch.clone(), FULL).await.unwrap();
  s.build(batch.clone(), INCREMENTAL).await.unwrap();
  assert_eq!(s.fact_count().await.unwrap(), 2 * batch.len() as u64);
}

#[tokio::test]
async fn incremental_extends_existing_dimensions() {
  let s = store().await;
  s.build(scenario(), FULL).await.unwrap();

  let report = s
    .build(vec![accident(Some("Orange"), "Clear", 60.0)], INCREMENTAL)
    .await
    .unwrap();

  let location = &report.dimensions[&Dimension::Location];
  assert_eq!(location.inserted, 1);
  assert_eq!(location.total, 2);
  assert_eq!(report.dimensions[&Dimension::Weather].inserted, 0);
  assert_eq!(s.fact_count().await.unwrap(), 3);
}

#[tokio::test]
async fn full_reset_is_deterministic() {
  let a = store().await;
  let b = store().await;
  a.build(clean_batch(), FULL).await.unwrap();
  b.build(scenario(), FULL).await.unwrap();
  // Second full build on `b` replaces its previous contents entirely.
  b.build(clean_batch(), FULL).await.unwrap();

  for dim in Dimension::iter() {
    assert_eq!(key_set(&a, dim).await, key_set(&b, dim).await, "{dim} differs");
  }
  assert_eq!(a.fact_count().await.unwrap(), b.fact_count().await.unwrap());
  assert_eq!(a.feature_rows().await.unwrap(), b.feature_rows().await.unwrap());
}

#[tokio::test]
async fn uniqueness_holds_across_runs() {
  let s = store().await;
  s.build(scenario(), FULL).await.unwrap();
  s.build(clean_batch(), INCREMENTAL).await.unwrap();
  s.build(scenario(), INCREMENTAL).await.unwrap();
  assert_unique(&s).await;
}

// ─── Null-safe policy ────────────────────────────────────────────────────────

#[tokio::test]
async fn null_safe_policy_keeps_every_row() {
  let s = store().await;
  let options = BuildOptions { mode: BuildMode::Full, null_policy: NullKeyPolicy::NullSafe };
  let report = s.build(scenario(), options).await.unwrap();

  assert_eq!(report.facts_inserted, 3);
  assert_eq!(report.facts_dropped, 0);
  assert_eq!(s.dimension_keys(Dimension::Location).await.unwrap().len(), 2);

  // NULL-bearing tuples are deduplicated like any other.
  let again = BuildOptions { mode: BuildMode::Incremental, ..options };
  let report = s.build(scenario(), again).await.unwrap();
  assert_eq!(report.dimensions[&Dimension::Location].inserted, 0);
  assert_unique(&s).await;
}

// ─── Feature read contract ───────────────────────────────────────────────────

#[tokio::test]
async fn feature_rows_derive_calendar_and_counts() {
  let s = store().await;
  let mut unlabeled = accident(Some("Los Angeles"), "Clear", 60.0);
  unlabeled.severity = None;
  s.build(vec![accident(Some("Los Angeles"), "Clear", 60.0), unlabeled], FULL)
    .await
    .unwrap();

  let rows = s.feature_rows().await.unwrap();
  assert_eq!(rows.len(), 1, "rows without a severity label are filtered");
  let row = &rows[0];
  assert_eq!(row.severity, 2);
  assert_eq!(row.calendar.hour, Some(22));
  assert_eq!(row.calendar.is_weekend, Some(true));
  assert_eq!(row.calendar.is_night, Some(true));
  assert_eq!(row.state.as_deref(), Some("CA"));
  assert_eq!(row.latitude, Some(34.0));
  assert_eq!(row.traffic_signal, Some(true));
  assert_eq!(row.major_road_feature_count, Some(1));
  assert_eq!(row.minor_road_feature_count, Some(0));
}

// ─── Failure handling ────────────────────────────────────────────────────────

#[tokio::test]
async fn incompatible_table_is_a_schema_error() {
  let s = store().await;
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "DROP TABLE accidents;
         DROP TABLE road_features;
         CREATE TABLE road_features (road_features_id INTEGER PRIMARY KEY, junction INTEGER);",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.build(scenario(), INCREMENTAL).await.unwrap_err();
  let (table, missing) = match err {
    Error::Schema { table, missing } => (table, missing),
    other => panic!("expected Schema error, got {other:?}"),
  };
  assert_eq!(table, "road_features");
  assert!(missing.contains(&"bump".to_owned()));

  // A full reset replaces the incompatible table.
  s.build(scenario(), FULL).await.unwrap();
  assert_eq!(s.fact_count().await.unwrap(), 2);
}

#[tokio::test]
async fn drifted_fact_table_on_disk_is_a_schema_error_until_full_reset() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("accidents.db");

  let s = SqliteStore::open(&path).await.unwrap();
  s.build(scenario(), FULL).await.unwrap();
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "DROP TABLE accidents;
         CREATE TABLE accidents (accident_id INTEGER PRIMARY KEY, severity INTEGER);",
      )?;
      Ok(())
    })
    .await
    .unwrap();
  drop(s);

  // Reopening declares only absent tables, so the drifted store still opens.
  let s = SqliteStore::open(&path).await.unwrap();

  let err = s.build(scenario(), INCREMENTAL).await.unwrap_err();
  let (table, missing) = match err {
    Error::Schema { table, missing } => (table, missing),
    other => panic!("expected Schema error, got {other:?}"),
  };
  assert_eq!(table, "accidents");
  assert!(missing.contains(&"location_id".to_owned()));
  assert!(missing.contains(&"weather_id".to_owned()));

  s.build(scenario(), FULL).await.unwrap();
  assert_eq!(s.fact_count().await.unwrap(), 2);
}

#[tokio::test]
async fn name_taken_by_another_object_is_a_declare_error() {
  let s = store().await;
  s.build(scenario(), FULL).await.unwrap();
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "DROP TABLE accidents;
         DROP TABLE locations;
         CREATE TABLE places (name TEXT);
         CREATE INDEX locations ON places(name);",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.build(scenario(), INCREMENTAL).await.unwrap_err();
  match err {
    Error::Declare { table, .. } => assert_eq!(table, "locations"),
    other => panic!("expected Declare error, got {other:?}"),
  }
  assert_eq!(s.row_count(STAGING_TABLE).await.unwrap(), 3, "build rolled back");
}

#[tokio::test]
async fn failed_incremental_build_leaves_store_untouched() {
  let s = store().await;
  s.build(scenario(), FULL).await.unwrap();
  s.conn
    .call(|conn| {
      conn.execute_batch("ALTER TABLE accidents DROP COLUMN description;")?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.build(clean_batch(), INCREMENTAL).await.unwrap_err();
  assert!(matches!(err, Error::Schema { .. }));
  assert_eq!(s.row_count(STAGING_TABLE).await.unwrap(), 3, "staging replacement rolled back");
  assert_eq!(s.dimension_keys(Dimension::Location).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_full_reset_keeps_previous_store() {
  let s = store().await;
  s.build(scenario(), FULL).await.unwrap();

  // A table outside the schema that references a dimension row blocks the
  // drop once the fact table is already gone.
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TABLE pinned (location_id INTEGER REFERENCES locations(location_id));
         INSERT INTO pinned VALUES (1);",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.build(clean_batch(), FULL).await.unwrap_err();
  assert!(matches!(err, Error::Write(_)), "got {err:?}");
  assert_eq!(s.fact_count().await.unwrap(), 2);
  assert_eq!(s.row_count(STAGING_TABLE).await.unwrap(), 3);
}

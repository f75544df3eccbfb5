//! SQL schema for the crashdb SQLite store.
//!
//! The dimension tables are generated from [`DimensionSpec`] so that the
//! UNIQUE constraint is always the exact natural-key tuple. Everything is
//! `CREATE … IF NOT EXISTS`; declaring the schema on an initialised store
//! leaves its data alone.
//!
//! Table declaration never names an existing table's columns, so it cannot
//! fail on a drifted table. Indexes do name columns and are only created
//! once [`check_shape`] has passed.

use crashdb_core::dimension::{Dimension, DimensionSpec};
use rusqlite::Connection;
use strum::IntoEnumIterator;

use crate::{Error, Result};

pub const STAGING_TABLE: &str = "stg_accidents";
pub const FACT_TABLE: &str = "accidents";

/// Connection-level settings, applied once on open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Transient staging relation; replaced wholesale by every build.
pub const CREATE_STAGING: &str = "
DROP TABLE IF EXISTS stg_accidents;

CREATE TABLE stg_accidents (
    accident_id       TEXT,
    severity          INTEGER,
    start_time        TEXT,
    end_time          TEXT,
    state             TEXT,
    county            TEXT,
    city              TEXT,
    start_lat         REAL,
    start_lng         REAL,
    temperature_f     REAL,
    visibility_mi     REAL,
    wind_speed_mph    REAL,
    precipitation_in  REAL,
    weather_condition TEXT,
    junction          INTEGER,
    traffic_signal    INTEGER,
    crossing          INTEGER,
    stop              INTEGER,
    railway           INTEGER,
    roundabout        INTEGER,
    bump              INTEGER,
    amenity           INTEGER,
    give_way          INTEGER,
    no_exit           INTEGER,
    station           INTEGER,
    traffic_calming   INTEGER,
    turning_loop      INTEGER,
    description       TEXT
);
";

pub const INSERT_STAGING: &str = "
INSERT INTO stg_accidents VALUES (
    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
    ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28
)";

/// Facts carry only surrogate references plus their own scalars.
/// There is no uniqueness constraint: incremental builds append.
pub const CREATE_FACTS: &str = "
CREATE TABLE IF NOT EXISTS accidents (
    accident_id            INTEGER PRIMARY KEY,
    severity               INTEGER,
    start_time             TEXT,
    end_time               TEXT,
    location_id            INTEGER NOT NULL REFERENCES locations(location_id),
    weather_id             INTEGER NOT NULL REFERENCES weather_conditions(weather_id),
    road_features_id       INTEGER NOT NULL REFERENCES road_features(road_features_id),
    minor_road_features_id INTEGER NOT NULL REFERENCES minor_road_features(minor_road_features_id),
    description            TEXT
);
";

pub const CREATE_FACT_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS accidents_location_idx ON accidents(location_id);
CREATE INDEX IF NOT EXISTS accidents_weather_idx  ON accidents(weather_id);
";

pub const FACT_COLUMNS: &[&str] = &[
  "accident_id",
  "severity",
  "start_time",
  "end_time",
  "location_id",
  "weather_id",
  "road_features_id",
  "minor_road_features_id",
  "description",
];

pub const INSERT_FACT: &str = "
INSERT INTO accidents (
    severity, start_time, end_time,
    location_id, weather_id, road_features_id, minor_road_features_id,
    description
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// Fact table first so enforced foreign keys never block a drop.
pub const DROP_ALL: &str = "
DROP TABLE IF EXISTS accidents;
DROP TABLE IF EXISTS minor_road_features;
DROP TABLE IF EXISTS road_features;
DROP TABLE IF EXISTS weather_conditions;
DROP TABLE IF EXISTS locations;
DROP TABLE IF EXISTS stg_accidents;
";

pub fn dimension_ddl(spec: &DimensionSpec) -> String {
  let columns: Vec<String> = spec
    .columns
    .iter()
    .map(|c| format!("    {} {}", c.name, c.sql_type.as_sql()))
    .collect();
  let unique: Vec<&str> = spec.columns.iter().map(|c| c.name).collect();
  format!(
    "CREATE TABLE IF NOT EXISTS {table} (\n    {id} INTEGER PRIMARY KEY,\n{columns},\n    UNIQUE ({unique})\n);\n",
    table = spec.table,
    id = spec.id,
    columns = columns.join(",\n"),
    unique = unique.join(", "),
  )
}

pub fn dimension_insert(spec: &DimensionSpec) -> String {
  let names: Vec<&str> = spec.columns.iter().map(|c| c.name).collect();
  let placeholders: Vec<String> =
    (1..=spec.columns.len() + 1).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {} ({}, {}) VALUES ({})",
    spec.table,
    spec.id,
    names.join(", "),
    placeholders.join(", "),
  )
}

fn declare(conn: &Connection, table: &str, sql: &str) -> Result<()> {
  conn
    .execute_batch(sql)
    .map_err(|source| Error::Declare { table: table.to_owned(), source })
}

/// Declare every dimension table and the fact table.
pub fn create_schema(conn: &Connection) -> Result<()> {
  for dim in Dimension::iter() {
    let spec = dim.spec();
    declare(conn, spec.table, &dimension_ddl(spec))?;
  }
  declare(conn, FACT_TABLE, CREATE_FACTS)
}

/// Index the fact table's foreign keys. Call after [`check_shape`].
pub fn create_indexes(conn: &Connection) -> Result<()> {
  declare(conn, FACT_TABLE, CREATE_FACT_INDEXES)
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
  let names = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(names)
}

fn require_columns(conn: &Connection, table: &str, expected: &[&str]) -> Result<()> {
  let present = table_columns(conn, table)
    .map_err(|source| Error::Declare { table: table.to_owned(), source })?;
  let missing: Vec<String> = expected
    .iter()
    .filter(|c| !present.iter().any(|p| p == *c))
    .map(|c| (*c).to_owned())
    .collect();
  if missing.is_empty() {
    Ok(())
  } else {
    Err(Error::Schema { table: table.to_owned(), missing })
  }
}

/// Verify that every declared table has at least the expected columns.
pub fn check_shape(conn: &Connection) -> Result<()> {
  for dim in Dimension::iter() {
    let spec = dim.spec();
    let mut expected = vec![spec.id];
    expected.extend(spec.columns.iter().map(|c| c.name));
    require_columns(conn, spec.table, &expected)?;
  }
  require_columns(conn, FACT_TABLE, FACT_COLUMNS)
}

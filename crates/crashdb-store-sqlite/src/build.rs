//! The build: one transaction from staging load to fact reconstruction.
//!
//! Order inside the transaction:
//!   drop (full reset only)
//!     └─ load_staging()        → stg_accidents replaced
//!          └─ create_schema() + check_shape() + create_indexes()
//!               └─ seed_arena() + populate_dimension()  (per dimension)
//!                    └─ reconstruct_facts()
//!
//! Nothing is visible to other connections until the commit; any error drops
//! the transaction and rolls the store back to its previous state.

use std::collections::BTreeMap;

use crashdb_core::{
  arena::KeyArena,
  dimension::{Dimension, DimensionSpec, NaturalKey},
  record::AccidentRecord,
  report::{BuildMode, BuildOptions, BuildReport, DimensionStats, NullKeyPolicy},
};
use rusqlite::{Connection, Transaction};
use strum::IntoEnumIterator;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
  Result,
  encode::{encode_key_value, read_key, staging_params},
  schema::{
    CREATE_STAGING, DROP_ALL, FACT_TABLE, INSERT_FACT, INSERT_STAGING, STAGING_TABLE,
    check_shape, create_indexes, create_schema, dimension_insert,
  },
};

pub(crate) fn run(
  conn:     &mut Connection,
  records:  &[AccidentRecord],
  options:  BuildOptions,
  build_id: Uuid,
) -> Result<BuildReport> {
  let _span = info_span!(
    "build",
    %build_id,
    mode = %options.mode,
    null_policy = %options.null_policy
  )
  .entered();
  let tx = conn.transaction()?;
  let mut report = BuildReport::new(build_id, options);

  if options.mode == BuildMode::Full {
    tx.execute_batch(DROP_ALL)?;
    info!("dropped fact, dimension and staging tables");
  }

  report.staged_rows = load_staging(&tx, records)?;
  info!(rows = report.staged_rows, "staging loaded");

  create_schema(&tx)?;
  check_shape(&tx)?;
  create_indexes(&tx)?;

  let mut arenas = BTreeMap::new();
  for dim in Dimension::iter() {
    let mut arena = seed_arena(&tx, dim.spec())?;
    let stats = populate_dimension(&tx, dim.spec(), &mut arena, options.null_policy)?;
    debug!(
      dimension = %dim,
      inserted = stats.inserted,
      total = stats.total,
      null_skipped = stats.null_skipped,
      "dimension populated"
    );
    report.dimensions.insert(dim, stats);
    arenas.insert(dim, arena);
  }

  let (inserted, dropped) = reconstruct_facts(&tx, &arenas, options.null_policy)?;
  report.facts_inserted = inserted;
  report.facts_dropped = dropped;

  if dropped > 0 {
    warn!(dropped, "staging rows with a NULL natural-key attribute produced no fact");
  }
  if options.mode == BuildMode::Incremental && inserted > 0 {
    warn!(inserted, "incremental build appended facts; re-running the same source duplicates them");
  }

  tx.commit()?;
  info!(facts = inserted, dropped, "build committed");
  Ok(report)
}

// ─── Staging ─────────────────────────────────────────────────────────────────

fn load_staging(tx: &Transaction<'_>, records: &[AccidentRecord]) -> Result<u64> {
  tx.execute_batch(CREATE_STAGING)?;
  let mut stmt = tx.prepare(INSERT_STAGING)?;
  for record in records {
    stmt.execute(&staging_params(record)[..])?;
  }
  Ok(records.len() as u64)
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// Load every persisted row of a dimension into a fresh arena.
fn seed_arena(tx: &Transaction<'_>, spec: &DimensionSpec) -> Result<KeyArena> {
  let names: Vec<&str> = spec.columns.iter().map(|c| c.name).collect();
  let sql = format!(
    "SELECT {}, {} FROM {} ORDER BY {}",
    spec.id,
    names.join(", "),
    spec.table,
    spec.id
  );
  let mut stmt = tx.prepare(&sql)?;
  let mut rows = stmt.query([])?;

  let mut arena = KeyArena::new();
  while let Some(row) = rows.next()? {
    let id: i64 = row.get(0)?;
    arena.seed(id, read_key(row, 1, spec.columns.len())?);
  }
  Ok(arena)
}

/// `SELECT DISTINCT` the natural-key tuples from staging and insert the ones
/// the dimension does not hold yet. Tuples already present are skipped,
/// never an error.
fn populate_dimension(
  tx:     &Transaction<'_>,
  spec:   &DimensionSpec,
  arena:  &mut KeyArena,
  policy: NullKeyPolicy,
) -> Result<DimensionStats> {
  let staging: Vec<&str> = spec.columns.iter().map(|c| c.staging).collect();
  let sql = format!("SELECT DISTINCT {} FROM {STAGING_TABLE}", staging.join(", "));

  let mut stats = DimensionStats::default();
  let mut stmt = tx.prepare(&sql)?;
  let mut rows = stmt.query([])?;
  while let Some(row) = rows.next()? {
    let key = read_key(row, 0, spec.columns.len())?;
    if policy == NullKeyPolicy::Drop && key.has_null() {
      stats.null_skipped += 1;
      continue;
    }
    arena.upsert_if_absent(&key);
  }

  let mut insert = tx.prepare(&dimension_insert(spec))?;
  for (id, key) in arena.pending() {
    let values = std::iter::once(rusqlite::types::Value::Integer(*id))
      .chain(key.0.iter().map(encode_key_value));
    insert.execute(rusqlite::params_from_iter(values))?;
  }

  stats.inserted = arena.pending().len() as u64;
  stats.total = arena.len() as u64;
  Ok(stats)
}

// ─── Facts ───────────────────────────────────────────────────────────────────

fn resolve(arena: &KeyArena, key: &NaturalKey, policy: NullKeyPolicy) -> Option<i64> {
  if policy == NullKeyPolicy::Drop && key.has_null() {
    return None;
  }
  arena.lookup(key)
}

/// Resolve every staging row against all four dimensions and insert one fact
/// per fully resolved row. Returns `(inserted, dropped)`.
fn reconstruct_facts(
  tx:     &Transaction<'_>,
  arenas: &BTreeMap<Dimension, KeyArena>,
  policy: NullKeyPolicy,
) -> Result<(u64, u64)> {
  let dims: Vec<Dimension> = Dimension::iter().collect();
  let key_columns: Vec<&str> = dims
    .iter()
    .flat_map(|d| d.spec().columns.iter().map(|c| c.staging))
    .collect();
  let sql = format!(
    "SELECT severity, start_time, end_time, description, {} FROM {STAGING_TABLE} ORDER BY rowid",
    key_columns.join(", ")
  );

  let mut select = tx.prepare(&sql)?;
  let mut insert = tx.prepare(INSERT_FACT)?;
  let mut rows = select.query([])?;
  let (mut inserted, mut dropped) = (0u64, 0u64);

  while let Some(row) = rows.next()? {
    let mut ids = Vec::with_capacity(dims.len());
    let mut offset = 4;
    for dim in &dims {
      let len = dim.spec().columns.len();
      let key = read_key(row, offset, len)?;
      offset += len;
      ids.push(arenas.get(dim).and_then(|arena| resolve(arena, &key, policy)));
    }

    let Some(ids) = ids.into_iter().collect::<Option<Vec<i64>>>() else {
      dropped += 1;
      continue;
    };

    let severity: Option<i64> = row.get(0)?;
    let start_time: Option<String> = row.get(1)?;
    let end_time: Option<String> = row.get(2)?;
    let description: Option<String> = row.get(3)?;
    insert.execute(rusqlite::params![
      severity,
      start_time,
      end_time,
      ids[0],
      ids[1],
      ids[2],
      ids[3],
      description,
    ])?;
    inserted += 1;
  }

  debug!(table = FACT_TABLE, inserted, dropped, "facts reconstructed");
  Ok((inserted, dropped))
}

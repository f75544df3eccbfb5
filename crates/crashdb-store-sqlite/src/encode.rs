//! Conversions between natural-key values and SQLite values.
//!
//! Reals keep their exact bit pattern through a REAL column, so a key read
//! back from a dimension table compares equal to the same key read from
//! staging.

use crashdb_core::{
  dimension::{KeyValue, NaturalKey},
  record::AccidentRecord,
};
use rusqlite::{
  Row, ToSql,
  types::{Value, ValueRef},
};

pub fn decode_key_value(v: ValueRef<'_>) -> KeyValue {
  match v {
    ValueRef::Null => KeyValue::Null,
    ValueRef::Integer(i) => KeyValue::Integer(i),
    ValueRef::Real(f) => KeyValue::real(Some(f)),
    ValueRef::Text(t) | ValueRef::Blob(t) => {
      KeyValue::Text(String::from_utf8_lossy(t).into_owned())
    }
  }
}

pub fn encode_key_value(v: &KeyValue) -> Value {
  match v {
    KeyValue::Null => Value::Null,
    KeyValue::Integer(i) => Value::Integer(*i),
    KeyValue::Real(f) => Value::Real(*f),
    KeyValue::Text(s) => Value::Text(s.clone()),
  }
}

/// Read `len` consecutive columns starting at `offset` as a natural key.
pub fn read_key(row: &Row<'_>, offset: usize, len: usize) -> rusqlite::Result<NaturalKey> {
  (offset..offset + len)
    .map(|i| row.get_ref(i).map(decode_key_value))
    .collect::<rusqlite::Result<Vec<_>>>()
    .map(NaturalKey)
}

/// Bind parameters for `INSERT_STAGING`, in staging column order.
pub fn staging_params(r: &AccidentRecord) -> [&dyn ToSql; 28] {
  [
    &r.accident_id,
    &r.severity,
    &r.start_time,
    &r.end_time,
    &r.state,
    &r.county,
    &r.city,
    &r.start_lat,
    &r.start_lng,
    &r.temperature_f,
    &r.visibility_mi,
    &r.wind_speed_mph,
    &r.precipitation_in,
    &r.weather_condition,
    &r.junction,
    &r.traffic_signal,
    &r.crossing,
    &r.stop,
    &r.railway,
    &r.roundabout,
    &r.bump,
    &r.amenity,
    &r.give_way,
    &r.no_exit,
    &r.station,
    &r.traffic_calming,
    &r.turning_loop,
    &r.description,
  ]
}

//! The four dimensions of the normalised schema and their natural keys.
//!
//! A dimension row is identified by a surrogate id and by the full tuple of
//! its descriptive attributes (the natural key). The tuple is declared
//! UNIQUE in the store and is the only thing used to join staging rows back
//! to their surrogate ids.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// One of the dimension tables split out of the flat source.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
  Serialize, Deserialize, EnumIter, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
  Location,
  Weather,
  RoadFeatures,
  MinorRoadFeatures,
}

/// Storage type of a natural-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
  Integer,
  Real,
  Text,
}

impl SqlType {
  pub fn as_sql(self) -> &'static str {
    match self {
      SqlType::Integer => "INTEGER",
      SqlType::Real => "REAL",
      SqlType::Text => "TEXT",
    }
  }
}

/// A natural-key column: its name in the dimension table and the staging
/// column it is populated from.
#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub name:     &'static str,
  pub staging:  &'static str,
  pub sql_type: SqlType,
}

impl Column {
  const fn same(name: &'static str, sql_type: SqlType) -> Self {
    Self { name, staging: name, sql_type }
  }

  const fn renamed(name: &'static str, staging: &'static str, sql_type: SqlType) -> Self {
    Self { name, staging, sql_type }
  }
}

/// Static shape of one dimension table.
#[derive(Debug)]
pub struct DimensionSpec {
  pub table:   &'static str,
  /// Surrogate key column; also the foreign-key column name in the fact table.
  pub id:      &'static str,
  pub columns: &'static [Column],
}

static LOCATION: DimensionSpec = DimensionSpec {
  table:   "locations",
  id:      "location_id",
  columns: &[
    Column::same("state", SqlType::Text),
    Column::same("county", SqlType::Text),
    Column::same("city", SqlType::Text),
    Column::renamed("latitude", "start_lat", SqlType::Real),
    Column::renamed("longitude", "start_lng", SqlType::Real),
  ],
};

static WEATHER: DimensionSpec = DimensionSpec {
  table:   "weather_conditions",
  id:      "weather_id",
  columns: &[
    Column::same("temperature_f", SqlType::Real),
    Column::same("visibility_mi", SqlType::Real),
    Column::same("wind_speed_mph", SqlType::Real),
    Column::same("precipitation_in", SqlType::Real),
    Column::same("weather_condition", SqlType::Text),
  ],
};

static ROAD_FEATURES: DimensionSpec = DimensionSpec {
  table:   "road_features",
  id:      "road_features_id",
  columns: &[
    Column::same("junction", SqlType::Integer),
    Column::same("traffic_signal", SqlType::Integer),
    Column::same("crossing", SqlType::Integer),
    Column::same("stop", SqlType::Integer),
    Column::same("railway", SqlType::Integer),
    Column::same("roundabout", SqlType::Integer),
    Column::same("bump", SqlType::Integer),
  ],
};

static MINOR_ROAD_FEATURES: DimensionSpec = DimensionSpec {
  table:   "minor_road_features",
  id:      "minor_road_features_id",
  columns: &[
    Column::same("amenity", SqlType::Integer),
    Column::same("give_way", SqlType::Integer),
    Column::same("no_exit", SqlType::Integer),
    Column::same("station", SqlType::Integer),
    Column::same("traffic_calming", SqlType::Integer),
    Column::same("turning_loop", SqlType::Integer),
  ],
};

impl Dimension {
  pub fn spec(self) -> &'static DimensionSpec {
    match self {
      Dimension::Location => &LOCATION,
      Dimension::Weather => &WEATHER,
      Dimension::RoadFeatures => &ROAD_FEATURES,
      Dimension::MinorRoadFeatures => &MINOR_ROAD_FEATURES,
    }
  }
}

// ─── Key values ──────────────────────────────────────────────────────────────

/// One attribute of a natural key.
///
/// Unlike SQL values, `KeyValue` has total equality: `Null == Null`, and
/// reals compare by bit pattern (with `-0.0` folded into `0.0`). Whether a
/// `Null` is allowed to *match* is decided by the caller, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyValue {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl KeyValue {
  pub fn text(v: Option<&str>) -> Self {
    v.map_or(KeyValue::Null, |s| KeyValue::Text(s.to_owned()))
  }

  pub fn real(v: Option<f64>) -> Self {
    match v {
      Some(f) if !f.is_nan() => KeyValue::Real(if f == 0.0 { 0.0 } else { f }),
      _ => KeyValue::Null,
    }
  }

  pub fn flag(v: Option<bool>) -> Self {
    v.map_or(KeyValue::Null, |b| KeyValue::Integer(i64::from(b)))
  }

  pub fn is_null(&self) -> bool { matches!(self, KeyValue::Null) }
}

impl PartialEq for KeyValue {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (KeyValue::Null, KeyValue::Null) => true,
      (KeyValue::Integer(a), KeyValue::Integer(b)) => a == b,
      (KeyValue::Real(a), KeyValue::Real(b)) => a.to_bits() == b.to_bits(),
      (KeyValue::Text(a), KeyValue::Text(b)) => a == b,
      _ => false,
    }
  }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
  fn hash<H: Hasher>(&self, state: &mut H) {
    std::mem::discriminant(self).hash(state);
    match self {
      KeyValue::Null => {}
      KeyValue::Integer(i) => i.hash(state),
      KeyValue::Real(f) => f.to_bits().hash(state),
      KeyValue::Text(s) => s.hash(state),
    }
  }
}

/// The full attribute tuple of a dimension row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey(pub Vec<KeyValue>);

impl NaturalKey {
  /// `true` if any attribute is NULL; such a key never matches under
  /// SQL equality semantics.
  pub fn has_null(&self) -> bool { self.0.iter().any(KeyValue::is_null) }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn table_names_are_distinct() {
    let tables: HashSet<_> = Dimension::iter().map(|d| d.spec().table).collect();
    assert_eq!(tables.len(), 4);
  }

  #[test]
  fn display_is_snake_case() {
    assert_eq!(Dimension::MinorRoadFeatures.to_string(), "minor_road_features");
  }

  #[test]
  fn negative_zero_folds_to_zero() {
    assert_eq!(KeyValue::real(Some(-0.0)), KeyValue::real(Some(0.0)));
  }

  #[test]
  fn nan_is_null() {
    assert!(KeyValue::real(Some(f64::NAN)).is_null());
  }

  #[test]
  fn integer_and_real_are_different_values() {
    assert_ne!(KeyValue::Integer(1), KeyValue::Real(1.0));
  }
}

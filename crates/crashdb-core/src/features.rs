//! The model-ready feature row read back out of the normalised store.
//!
//! One row per fact with a non-null severity. Dimension attributes are
//! carried as-is; calendar fields are derived from the fact's start time.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

// ─── Calendar ────────────────────────────────────────────────────────────────

/// Calendar fields derived from a start timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeatures {
  pub hour:       Option<u32>,
  /// Day of week, 0 = Sunday … 6 = Saturday.
  pub day:        Option<u32>,
  pub month:      Option<u32>,
  pub is_weekend: Option<bool>,
  pub is_night:   Option<bool>,
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_start_time(raw: &str) -> Option<NaiveDateTime> {
  let raw = raw.trim();
  NAIVE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

pub fn is_weekend(day: u32) -> bool { day == 0 || day == 6 }

pub fn is_night(hour: u32) -> bool { (20..=23).contains(&hour) || hour <= 5 }

impl CalendarFeatures {
  /// Unparsable or missing timestamps yield all-`None` fields.
  pub fn from_start_time(raw: Option<&str>) -> Self {
    let Some(dt) = raw.and_then(parse_start_time) else {
      return Self::default();
    };
    let hour = dt.hour();
    let day = dt.weekday().num_days_from_sunday();
    Self {
      hour:       Some(hour),
      day:        Some(day),
      month:      Some(dt.month()),
      is_weekend: Some(is_weekend(day)),
      is_night:   Some(is_night(hour)),
    }
  }
}

// ─── Feature row ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
  pub severity:                 i64,
  #[serde(flatten)]
  pub calendar:                 CalendarFeatures,

  pub state:                    Option<String>,
  pub latitude:                 Option<f64>,
  pub longitude:                Option<f64>,

  pub temperature_f:            Option<f64>,
  pub visibility_mi:            Option<f64>,
  pub wind_speed_mph:           Option<f64>,
  pub precipitation_in:         Option<f64>,
  pub weather_condition:        Option<String>,

  pub junction:                 Option<bool>,
  pub traffic_signal:           Option<bool>,
  pub crossing:                 Option<bool>,
  pub stop:                     Option<bool>,
  pub railway:                  Option<bool>,
  pub roundabout:               Option<bool>,
  pub bump:                     Option<bool>,

  pub amenity:                  Option<bool>,
  pub give_way:                 Option<bool>,
  pub no_exit:                  Option<bool>,
  pub station:                  Option<bool>,
  pub traffic_calming:          Option<bool>,
  pub turning_loop:             Option<bool>,

  pub major_road_feature_count: Option<u32>,
  pub minor_road_feature_count: Option<u32>,
}

/// Number of set flags, or `None` if any flag is NULL (SQL `+` semantics).
pub fn flag_count(flags: &[Option<bool>]) -> Option<u32> {
  flags
    .iter()
    .try_fold(0u32, |acc, f| f.map(|set| acc + u32::from(set)))
}

impl FeatureRow {
  /// Fill in the two feature-count columns from the individual flags.
  pub fn with_counts(mut self) -> Self {
    self.major_road_feature_count = flag_count(&[
      self.junction,
      self.traffic_signal,
      self.crossing,
      self.stop,
      self.railway,
      self.roundabout,
      self.bump,
    ]);
    self.minor_road_feature_count = flag_count(&[
      self.amenity,
      self.give_way,
      self.no_exit,
      self.station,
      self.traffic_calming,
      self.turning_loop,
    ]);
    self
  }
}

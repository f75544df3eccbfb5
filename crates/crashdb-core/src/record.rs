//! The staging record: one row of the flat accident source after projection.
//!
//! Every attribute is optional. An absent source cell is `None` and behaves
//! like SQL `NULL` everywhere downstream.

use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, KeyValue, NaturalKey};

/// One staging row. Field names are the lower-cased staging column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccidentRecord {
  pub accident_id:       Option<String>,
  pub severity:          Option<i64>,
  pub start_time:        Option<String>,
  pub end_time:          Option<String>,

  // location
  pub state:             Option<String>,
  pub county:            Option<String>,
  pub city:              Option<String>,
  pub start_lat:         Option<f64>,
  pub start_lng:         Option<f64>,

  // weather
  pub temperature_f:     Option<f64>,
  pub visibility_mi:     Option<f64>,
  pub wind_speed_mph:    Option<f64>,
  pub precipitation_in:  Option<f64>,
  pub weather_condition: Option<String>,

  // major road features
  pub junction:          Option<bool>,
  pub traffic_signal:    Option<bool>,
  pub crossing:          Option<bool>,
  pub stop:              Option<bool>,
  pub railway:           Option<bool>,
  pub roundabout:        Option<bool>,
  pub bump:              Option<bool>,

  // minor road features
  pub amenity:           Option<bool>,
  pub give_way:          Option<bool>,
  pub no_exit:           Option<bool>,
  pub station:           Option<bool>,
  pub traffic_calming:   Option<bool>,
  pub turning_loop:      Option<bool>,

  pub description:       Option<String>,
}

impl AccidentRecord {
  /// The natural-key tuple this record carries for `dimension`, in the
  /// column order of [`Dimension::spec`].
  pub fn natural_key(&self, dimension: Dimension) -> NaturalKey {
    let parts = match dimension {
      Dimension::Location => vec![
        KeyValue::text(self.state.as_deref()),
        KeyValue::text(self.county.as_deref()),
        KeyValue::text(self.city.as_deref()),
        KeyValue::real(self.start_lat),
        KeyValue::real(self.start_lng),
      ],
      Dimension::Weather => vec![
        KeyValue::real(self.temperature_f),
        KeyValue::real(self.visibility_mi),
        KeyValue::real(self.wind_speed_mph),
        KeyValue::real(self.precipitation_in),
        KeyValue::text(self.weather_condition.as_deref()),
      ],
      Dimension::RoadFeatures => vec![
        KeyValue::flag(self.junction),
        KeyValue::flag(self.traffic_signal),
        KeyValue::flag(self.crossing),
        KeyValue::flag(self.stop),
        KeyValue::flag(self.railway),
        KeyValue::flag(self.roundabout),
        KeyValue::flag(self.bump),
      ],
      Dimension::MinorRoadFeatures => vec![
        KeyValue::flag(self.amenity),
        KeyValue::flag(self.give_way),
        KeyValue::flag(self.no_exit),
        KeyValue::flag(self.station),
        KeyValue::flag(self.traffic_calming),
        KeyValue::flag(self.turning_loop),
      ],
    };
    NaturalKey(parts)
  }
}

//! Descriptive statistics over the feature rows, used to bound input forms.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::features::FeatureRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
  pub min:    f64,
  pub max:    f64,
  pub mean:   f64,
  pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSummary {
  pub unique_values: Vec<String>,
  pub value_counts:  BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSummary {
  pub numerical:   BTreeMap<String, NumericSummary>,
  pub categorical: BTreeMap<String, ValueSummary>,
  pub binary:      BTreeMap<String, ValueSummary>,
}

type NumericColumn = (&'static str, fn(&FeatureRow) -> Option<f64>);
type ValueColumn = (&'static str, fn(&FeatureRow) -> Option<String>);

const NUMERICAL: &[NumericColumn] = &[
  ("hour", |r: &FeatureRow| r.calendar.hour.map(f64::from)),
  ("month", |r: &FeatureRow| r.calendar.month.map(f64::from)),
  ("latitude", |r: &FeatureRow| r.latitude),
  ("longitude", |r: &FeatureRow| r.longitude),
  ("temperature_f", |r: &FeatureRow| r.temperature_f),
  ("visibility_mi", |r: &FeatureRow| r.visibility_mi),
  ("wind_speed_mph", |r: &FeatureRow| r.wind_speed_mph),
  ("precipitation_in", |r: &FeatureRow| r.precipitation_in),
];

const CATEGORICAL: &[ValueColumn] = &[
  ("state", |r: &FeatureRow| r.state.clone()),
  ("weather_condition", |r: &FeatureRow| r.weather_condition.clone()),
];

fn bit(v: Option<bool>) -> Option<String> { v.map(|b| u8::from(b).to_string()) }

const BINARY: &[ValueColumn] = &[
  ("is_weekend", |r: &FeatureRow| bit(r.calendar.is_weekend)),
  ("is_night", |r: &FeatureRow| bit(r.calendar.is_night)),
  ("junction", |r: &FeatureRow| bit(r.junction)),
  ("traffic_signal", |r: &FeatureRow| bit(r.traffic_signal)),
  ("crossing", |r: &FeatureRow| bit(r.crossing)),
  ("stop", |r: &FeatureRow| bit(r.stop)),
  ("railway", |r: &FeatureRow| bit(r.railway)),
  ("roundabout", |r: &FeatureRow| bit(r.roundabout)),
  ("bump", |r: &FeatureRow| bit(r.bump)),
];

/// `None` when `values` is empty.
pub fn numeric_summary(mut values: Vec<f64>) -> Option<NumericSummary> {
  values.retain(|v| !v.is_nan());
  if values.is_empty() {
    return None;
  }
  values.sort_by(f64::total_cmp);
  let n = values.len();
  let median = if n % 2 == 1 {
    values[n / 2]
  } else {
    (values[n / 2 - 1] + values[n / 2]) / 2.0
  };
  Some(NumericSummary {
    min: values[0],
    max: values[n - 1],
    mean: values.iter().sum::<f64>() / n as f64,
    median,
  })
}

fn count_values(values: impl Iterator<Item = String>) -> BTreeMap<String, u64> {
  let mut counts: HashMap<String, u64> = HashMap::new();
  for v in values {
    *counts.entry(v).or_default() += 1;
  }
  counts.into_iter().collect()
}

/// Unique values ordered by frequency, most frequent first.
fn by_frequency(counts: &BTreeMap<String, u64>) -> Vec<String> {
  let mut pairs: Vec<_> = counts.iter().collect();
  pairs.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
  pairs.into_iter().map(|(v, _)| v.clone()).collect()
}

impl SchemaSummary {
  pub fn from_rows(rows: &[FeatureRow]) -> Self {
    let mut summary = Self::default();

    for (name, get) in NUMERICAL {
      if let Some(s) = numeric_summary(rows.iter().filter_map(get).collect()) {
        summary.numerical.insert((*name).to_owned(), s);
      }
    }

    for (name, get) in CATEGORICAL {
      let value_counts = count_values(rows.iter().filter_map(get));
      let unique_values = by_frequency(&value_counts);
      summary
        .categorical
        .insert((*name).to_owned(), ValueSummary { unique_values, value_counts });
    }

    for (name, get) in BINARY {
      let value_counts = count_values(rows.iter().filter_map(get));
      let unique_values = value_counts.keys().cloned().collect();
      summary
        .binary
        .insert((*name).to_owned(), ValueSummary { unique_values, value_counts });
    }

    summary
  }
}

//! CSV extraction.
//!
//! Pipeline:
//!   csv::Reader
//!     └─ Projection::from_headers() → header index per staging column
//!          └─ Bernoulli sample      → kept rows
//!               └─ Projection::record() → AccidentRecord

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crashdb_core::record::AccidentRecord;
use csv::StringRecord;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
  columns::{SOURCE_COLUMNS, staging_name},
  error::{Error, Result},
};

pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.02;
pub const DEFAULT_SEED: u64 = 42;

/// Sampling parameters for one extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
  /// Probability that any one source row is kept; must be in (0, 1].
  pub sample_fraction: f64,
  /// Seed for the sampler. The same source, fraction and seed always yield
  /// the same rows.
  pub seed:            u64,
}

impl Default for ExtractOptions {
  fn default() -> Self {
    Self { sample_fraction: DEFAULT_SAMPLE_FRACTION, seed: DEFAULT_SEED }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Extract staging records from the CSV file at `path`.
pub fn extract(path: impl AsRef<Path>, options: &ExtractOptions) -> Result<Vec<AccidentRecord>> {
  let path = path.as_ref();
  let file = match File::open(path) {
    Ok(f) => f,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      return Err(Error::SourceNotFound(path.to_path_buf()));
    }
    Err(e) => return Err(e.into()),
  };
  info!(path = %path.display(), fraction = options.sample_fraction, "extracting source");
  extract_reader(file, options)
}

/// Extract staging records from any CSV byte stream.
pub fn extract_reader<R: Read>(input: R, options: &ExtractOptions) -> Result<Vec<AccidentRecord>> {
  let fraction = options.sample_fraction;
  if !(fraction > 0.0 && fraction <= 1.0) {
    return Err(Error::InvalidFraction(fraction));
  }

  let mut reader = csv::ReaderBuilder::new().from_reader(input);
  let projection = Projection::from_headers(reader.headers()?)?;
  let mut rng = StdRng::seed_from_u64(options.seed);

  let mut records = Vec::new();
  let mut read = 0u64;
  for row in reader.records() {
    let row = row?;
    read += 1;
    if fraction < 1.0 && !rng.gen_bool(fraction) {
      continue;
    }
    records.push(projection.record(&row)?);
  }

  info!(read, kept = records.len(), "source extracted");
  Ok(records)
}

// ─── Projection ──────────────────────────────────────────────────────────────

struct Projection {
  /// staging column name → position in the source record
  index: HashMap<String, usize>,
}

impl Projection {
  fn from_headers(headers: &StringRecord) -> Result<Self> {
    let mut index = HashMap::new();
    let mut missing = Vec::new();

    for (source, rename) in SOURCE_COLUMNS {
      match headers.iter().position(|h| h == *source) {
        Some(i) => {
          index.insert(staging_name(source, *rename), i);
        }
        None => missing.push((*source).to_owned()),
      }
    }

    if !missing.is_empty() {
      return Err(Error::SchemaMismatch { missing });
    }
    debug!(columns = index.len(), ignored = headers.len() - index.len(), "projection resolved");
    Ok(Self { index })
  }

  fn record(&self, row: &StringRecord) -> Result<AccidentRecord> {
    let cells = Cells {
      projection: self,
      row,
      line: row.position().map_or(0, |p| p.line()),
    };

    Ok(AccidentRecord {
      accident_id:       cells.text("accident_id"),
      severity:          cells.integer("severity")?,
      start_time:        cells.text("start_time"),
      end_time:          cells.text("end_time"),
      state:             cells.text("state"),
      county:            cells.text("county"),
      city:              cells.text("city"),
      start_lat:         cells.real("start_lat")?,
      start_lng:         cells.real("start_lng")?,
      temperature_f:     cells.real("temperature_f")?,
      visibility_mi:     cells.real("visibility_mi")?,
      wind_speed_mph:    cells.real("wind_speed_mph")?,
      precipitation_in:  cells.real("precipitation_in")?,
      weather_condition: cells.text("weather_condition"),
      junction:          cells.flag("junction")?,
      traffic_signal:    cells.flag("traffic_signal")?,
      crossing:          cells.flag("crossing")?,
      stop:              cells.flag("stop")?,
      railway:           cells.flag("railway")?,
      roundabout:        cells.flag("roundabout")?,
      bump:              cells.flag("bump")?,
      amenity:           cells.flag("amenity")?,
      give_way:          cells.flag("give_way")?,
      no_exit:           cells.flag("no_exit")?,
      station:           cells.flag("station")?,
      traffic_calming:   cells.flag("traffic_calming")?,
      turning_loop:      cells.flag("turning_loop")?,
      description:       cells.text("description"),
    })
  }
}

/// Typed access to the cells of one source row. Empty cells are `None`.
/// Text cells are kept verbatim; numeric and boolean cells are trimmed
/// before parsing.
struct Cells<'a> {
  projection: &'a Projection,
  row:        &'a StringRecord,
  line:       u64,
}

impl Cells<'_> {
  fn raw(&self, column: &str) -> Option<&str> {
    let i = *self.projection.index.get(column)?;
    self.row.get(i).filter(|s| !s.is_empty())
  }

  fn trimmed(&self, column: &str) -> Option<&str> {
    self.raw(column).map(str::trim).filter(|s| !s.is_empty())
  }

  fn invalid(&self, column: &'static str, value: &str) -> Error {
    Error::InvalidValue { line: self.line, column, value: value.to_owned() }
  }

  fn text(&self, column: &'static str) -> Option<String> { self.raw(column).map(str::to_owned) }

  fn integer(&self, column: &'static str) -> Result<Option<i64>> {
    self
      .trimmed(column)
      .map(|s| s.parse::<i64>().map_err(|_| self.invalid(column, s)))
      .transpose()
  }

  fn real(&self, column: &'static str) -> Result<Option<f64>> {
    let Some(s) = self.trimmed(column) else { return Ok(None) };
    let v: f64 = s.parse().map_err(|_| self.invalid(column, s))?;
    Ok((!v.is_nan()).then_some(v))
  }

  fn flag(&self, column: &'static str) -> Result<Option<bool>> {
    let Some(s) = self.trimmed(column) else { return Ok(None) };
    if s.eq_ignore_ascii_case("true") || s == "1" {
      Ok(Some(true))
    } else if s.eq_ignore_ascii_case("false") || s == "0" {
      Ok(Some(false))
    } else {
      Err(self.invalid(column, s))
    }
  }
}

//! The fixed projection from source headers to staging columns.

/// Source headers read by the extractor, with an explicit rename where the
/// staging name is not simply the lower-cased header.
pub static SOURCE_COLUMNS: &[(&str, Option<&str>)] = &[
  ("ID", Some("accident_id")),
  ("Severity", None),
  ("Start_Time", None),
  ("End_Time", None),
  ("State", None),
  ("County", None),
  ("City", None),
  ("Start_Lat", None),
  ("Start_Lng", None),
  ("Temperature(F)", Some("temperature_f")),
  ("Visibility(mi)", Some("visibility_mi")),
  ("Wind_Speed(mph)", Some("wind_speed_mph")),
  ("Precipitation(in)", Some("precipitation_in")),
  ("Weather_Condition", None),
  ("Junction", None),
  ("Traffic_Signal", None),
  ("Crossing", None),
  ("Stop", None),
  ("Railway", None),
  ("Roundabout", None),
  ("Bump", None),
  ("Amenity", None),
  ("Give_Way", None),
  ("No_Exit", None),
  ("Station", None),
  ("Traffic_Calming", None),
  ("Turning_Loop", None),
  ("Description", None),
];

/// Staging column name for a source header: the rename if one is declared,
/// lower-cased either way.
pub fn staging_name(source: &str, rename: Option<&str>) -> String {
  rename.unwrap_or(source).to_lowercase()
}

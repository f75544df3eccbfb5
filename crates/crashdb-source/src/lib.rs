//! Source extractor for crashdb.
//!
//! Reads the wide accident CSV, projects and renames the fixed column set,
//! parses each cell into a typed [`AccidentRecord`] and optionally samples a
//! fraction of the rows. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use crashdb_source::{ExtractOptions, extract};
//!
//! let records = extract("data/US_Accidents_March23.csv", &ExtractOptions::default()).unwrap();
//! println!("{} staging rows", records.len());
//! ```

mod columns;
pub mod error;
mod extract;

pub use columns::{SOURCE_COLUMNS, staging_name};
pub use error::{Error, Result};
pub use extract::{ExtractOptions, extract, extract_reader};

pub use crashdb_core::record::AccidentRecord;

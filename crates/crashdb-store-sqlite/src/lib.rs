//! SQLite backend for the crashdb normalised accident store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. A build is one SQLite
//! transaction: staging load, schema declaration, dimension population and
//! fact reconstruction commit together or not at all.

mod build;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use schema::{FACT_TABLE, STAGING_TABLE};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;

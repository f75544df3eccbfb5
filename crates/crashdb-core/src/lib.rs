//! Core types and trait definitions for the crashdb normalised accident store.
//!
//! This crate is deliberately free of file and database dependencies. The
//! extractor, the SQLite backend and the pipeline all depend on it.

pub mod arena;
pub mod dimension;
pub mod features;
pub mod record;
pub mod report;
pub mod store;
pub mod summary;

//! CLI support for the sql-ingest binary

#[cfg(feature = "cli")]
pub mod output;

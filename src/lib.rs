//! logdeck library entrypoint.
//!
//! Modules:
//! - `app`: startup, configuration, shared state
//! - `http`: Axum router and handlers
//! - `db`: migrations and SQLite helpers
//! - `parser`: line parser turning uploads into entries
//! - `store`: atomic batch inserts, filtered queries, aggregates
//! - `ingest`: upload validation and ingestion
//! - `query`: filter validation and statistics
//! - `models`: typed records used across layers
//! - `error`: service and configuration errors
//! - `util`: tracing setup

pub mod app;
pub mod db;
pub mod error;
pub mod http;
pub mod ingest;
pub mod models;
pub mod parser;
pub mod query;
pub mod store;
pub mod util;

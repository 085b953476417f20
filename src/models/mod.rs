//! Typed records shared by the store, services and HTTP layer.

pub mod ingest;
pub mod log;
pub mod stats;

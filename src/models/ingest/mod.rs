pub mod ingest_report;

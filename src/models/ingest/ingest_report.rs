//! Outcome of ingesting one file.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted_count: usize,
    pub skipped_count: usize,
}

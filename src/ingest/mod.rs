//! Upload ingestion: file kind check, decode, parse, atomic insert.

use crate::{
    error::ServiceError,
    models::ingest::ingest_report::IngestReport,
    parser::{self, LogParser},
    store::LogStore,
};
use std::{path::Path, sync::Arc};
use tracing::{debug, info};

#[derive(Clone)]
pub struct IngestService {
    store: LogStore,
    parser: LogParser,
    /// Accepted extensions, lowercase, without the leading dot.
    extensions: Arc<[String]>,
}

impl IngestService {
    pub fn new(store: LogStore, parser: LogParser, extensions: &[String]) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            store,
            parser,
            extensions,
        }
    }

    /// Ingest an uploaded file after checking its extension.
    pub async fn ingest(&self, filename: &str, raw: &[u8]) -> Result<IngestReport, ServiceError> {
        let name = base_name(filename);
        self.check_file_kind(name)?;
        self.ingest_content(name, raw).await
    }

    /// Ingest raw content with no filename validation. `source_name` is used
    /// as the entry source unless lines carry their own.
    pub async fn ingest_content(
        &self,
        source_name: &str,
        raw: &[u8],
    ) -> Result<IngestReport, ServiceError> {
        let text = parser::decode(raw)?;
        let outcome = self.parser.parse(text, source_name);
        debug!(
            source = source_name,
            source_from = ?self.parser.config().source_from,
            parsed = outcome.entries.len(),
            "parsed upload"
        );
        let ids = self.store.insert_batch(&outcome.entries).await?;
        let report = IngestReport {
            inserted_count: ids.len(),
            skipped_count: outcome.skipped,
        };
        info!(
            source = source_name,
            inserted = report.inserted_count,
            skipped = report.skipped_count,
            "ingested log file"
        );
        Ok(report)
    }

    fn check_file_kind(&self, filename: &str) -> Result<(), ServiceError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext {
            Some(ext) if self.extensions.contains(&ext) => Ok(()),
            _ => Err(ServiceError::InvalidFileKind {
                filename: filename.to_string(),
                expected: self
                    .extensions
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Last path component of a client-supplied file name.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        parser::{ParserConfig, SourceFrom},
        store::LogFilter,
    };

    async fn service(source_from: SourceFrom) -> IngestService {
        let pool = db::connect("sqlite://:memory:", 2).await.expect("connect memory sqlite");
        db::run_migrations(&pool).await.expect("migrate");
        IngestService::new(
            LogStore::new(pool),
            LogParser::new(ParserConfig { source_from }),
            &["log".to_string(), ".TXT".to_string()],
        )
    }

    #[tokio::test]
    async fn ingests_mixed_file() {
        let svc = service(SourceFrom::Filename).await;
        let content = "2024-01-01 10:00:00 ERROR boom\nnot a log line\n2024-01-01 11:00:00 INFO ok\n";
        let report = svc.ingest("app.log", content.as_bytes()).await.unwrap();
        assert_eq!(
            report,
            IngestReport {
                inserted_count: 2,
                skipped_count: 1
            }
        );

        let info = svc
            .store
            .query(&LogFilter {
                level: Some("info".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].message, "ok");
        assert_eq!(info[0].source, "app.log");
    }

    #[tokio::test]
    async fn rejects_wrong_extension() {
        let svc = service(SourceFrom::Filename).await;
        let err = svc
            .ingest("notes.csv", b"2024-01-01 10:00:00 INFO ok")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidFileKind { .. }));
        assert!(svc.ingest("NOTES.TXT", b"").await.is_ok());
        assert!(svc.ingest("Makefile", b"").await.is_err());
    }

    #[tokio::test]
    async fn content_path_skips_extension_check() {
        let svc = service(SourceFrom::Filename).await;
        let report = svc
            .ingest_content("import.dump", b"2024-01-01 10:00:00 INFO ok")
            .await
            .unwrap();
        assert_eq!(report.inserted_count, 1);
    }

    #[tokio::test]
    async fn empty_or_garbage_upload_is_not_an_error() {
        let svc = service(SourceFrom::Filename).await;
        let report = svc.ingest("empty.log", b"\n\n").await.unwrap();
        assert_eq!(report, IngestReport::default());
        let report = svc.ingest("junk.log", b"a\nb\nc").await.unwrap();
        assert_eq!(report.inserted_count, 0);
        assert_eq!(report.skipped_count, 3);
        assert_eq!(svc.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn binary_upload_is_decode_error() {
        let svc = service(SourceFrom::Filename).await;
        let err = svc.ingest("bin.log", &[0x00, 0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }

    #[tokio::test]
    async fn strips_client_directories_from_source() {
        let svc = service(SourceFrom::Filename).await;
        svc.ingest(r"C:\logs\web.log", b"2024-01-01 10:00:00 INFO ok")
            .await
            .unwrap();
        let all = svc.store.query(&LogFilter::default()).await.unwrap();
        assert_eq!(all[0].source, "web.log");
    }

    #[tokio::test]
    async fn line_sources_override_filename() {
        let svc = service(SourceFrom::Line).await;
        svc.ingest("mixed.log", b"2024-01-01 10:00:00 INFO auth login ok\n2024-01-01 10:00:01 WARN db slow query")
            .await
            .unwrap();
        let stats = svc.store.aggregate().await.unwrap();
        let names: Vec<&str> = stats.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["auth", "db"]);
    }
}

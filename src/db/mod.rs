//! Database helpers: connection, migrations and path handling.

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{path::Path, str::FromStr, time::Duration};

use crate::store::fold;

/// Open a pool for a sqlx SQLite URL, creating the database file if needed.
pub async fn connect(db_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let db_url = ensure_sqlite_path(db_url);
    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Run SQLite migrations to create tables if absent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts_us INTEGER NOT NULL,
            level TEXT NOT NULL,
            level_folded TEXT NOT NULL,
            source TEXT NOT NULL,
            message TEXT NOT NULL,
            message_folded TEXT NOT NULL,
            created_at_us INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;
    add_folded_columns(pool).await?;

    sqlx::query("DROP INDEX IF EXISTS idx_logs_level").execute(pool).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_ts ON logs (ts_us, id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_level_folded ON logs (level_folded)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_source ON logs (source)")
        .execute(pool)
        .await?;
    Ok(())
}

/// Databases created before the folded columns existed get them added and
/// filled from the stored `level`/`message`.
async fn add_folded_columns(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let present: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('logs') WHERE name = 'message_folded'",
    )
    .fetch_one(pool)
    .await?;
    if present > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    sqlx::query("ALTER TABLE logs ADD COLUMN level_folded TEXT NOT NULL DEFAULT ''")
        .execute(&mut *tx)
        .await?;
    sqlx::query("ALTER TABLE logs ADD COLUMN message_folded TEXT NOT NULL DEFAULT ''")
        .execute(&mut *tx)
        .await?;
    let rows: Vec<(i64, String, String)> = sqlx::query_as("SELECT id, level, message FROM logs")
        .fetch_all(&mut *tx)
        .await?;
    for (id, level, message) in rows {
        sqlx::query("UPDATE logs SET level_folded = ?, message_folded = ? WHERE id = ?")
            .bind(fold(&level))
            .bind(fold(&message))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await
}

/// Ensure the parent folder of a SQLite file exists for a given sqlx URL.
pub fn ensure_sqlite_path(db_url: &str) -> String {
    if !db_url.starts_with("sqlite:") {
        return db_url.to_string();
    }
    let path_part = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    if path_part.starts_with(":memory:") {
        return db_url.to_string();
    }
    let path_only = match path_part.split_once('?') {
        Some((p, _)) => p,
        None => path_part,
    };
    if !path_only.is_empty() {
        if let Some(parent) = Path::new(path_only).parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
    }
    db_url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_urls_are_untouched() {
        assert_eq!(ensure_sqlite_path("sqlite://:memory:"), "sqlite://:memory:");
        assert_eq!(ensure_sqlite_path("postgres://x"), "postgres://x");
    }

    #[test]
    fn creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/logs.db");
        let url = format!("sqlite://{}?mode=rwc", nested.display());
        assert_eq!(ensure_sqlite_path(&url), url);
        assert!(nested.parent().unwrap().is_dir());
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("logs.db").display());
        let pool = connect(&url, 1).await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn upgrades_tables_without_folded_columns() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("old.db").display());
        let pool = connect(&url, 1).await.unwrap();
        sqlx::query(
            r#"CREATE TABLE logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts_us INTEGER NOT NULL,
                level TEXT NOT NULL,
                source TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at_us INTEGER NOT NULL
            )"#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO logs (ts_us, level, source, message, created_at_us) \
             VALUES (0, 'ÉRREUR', 'old.log', 'Échec de connexion', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let (level, message): (String, String) =
            sqlx::query_as("SELECT level_folded, message_folded FROM logs")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(level, "érreur");
        assert_eq!(message, "échec de connexion");
    }
}

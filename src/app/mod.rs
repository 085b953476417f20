//! Application setup and runtime.

use crate::{
  db,
  error::ConfigError,
  http,
  ingest::IngestService,
  parser::{LogParser, ParserConfig, SourceFrom},
  query::QueryService,
  store::LogStore,
};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tracing::info;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime configuration, read from `LOGDECK_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub addr: SocketAddr,
  pub max_upload_bytes: usize,
  pub source_from: SourceFrom,
  pub extensions: Vec<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: "sqlite://logdeck.db".to_string(),
      addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
      source_from: SourceFrom::Filename,
      extensions: vec!["log".to_string()],
    }
  }
}

impl Config {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build a config from an arbitrary variable lookup; unset keys keep defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let mut cfg = Self::default();
    if let Some(url) = lookup("LOGDECK_DATABASE") {
      cfg.database_url = url;
    }
    if let Some(addr) = lookup("LOGDECK_ADDR") {
      cfg.addr = addr
        .parse()
        .map_err(|e| ConfigError::invalid("LOGDECK_ADDR", &addr, format!("{e}")))?;
    }
    if let Some(max) = lookup("LOGDECK_MAX_UPLOAD_BYTES") {
      cfg.max_upload_bytes = match max.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
          return Err(ConfigError::invalid(
            "LOGDECK_MAX_UPLOAD_BYTES",
            &max,
            "expected a positive byte count",
          ));
        }
      };
    }
    if let Some(mode) = lookup("LOGDECK_SOURCE_FROM") {
      cfg.source_from = mode
        .parse()
        .map_err(|e: String| ConfigError::invalid("LOGDECK_SOURCE_FROM", &mode, e))?;
    }
    if let Some(exts) = lookup("LOGDECK_EXTENSIONS") {
      let list: Vec<String> = exts
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
      if list.is_empty() {
        return Err(ConfigError::invalid(
          "LOGDECK_EXTENSIONS",
          &exts,
          "at least one extension is required",
        ));
      }
      cfg.extensions = list;
    }
    Ok(cfg)
  }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
  pub ingest: IngestService,
  pub query: QueryService,
  pub max_upload_bytes: usize,
}

impl AppState {
  pub fn new(pool: SqlitePool, config: &Config) -> Self {
    let store = LogStore::new(pool);
    let parser = LogParser::new(ParserConfig {
      source_from: config.source_from,
    });
    Self {
      ingest: IngestService::new(store.clone(), parser, &config.extensions),
      query: QueryService::new(store),
      max_upload_bytes: config.max_upload_bytes,
    }
  }
}

/// Open the configured database and run migrations.
pub async fn open_state(config: &Config) -> Result<AppState, sqlx::Error> {
  let pool = db::connect(&config.database_url, 5).await?;
  db::run_migrations(&pool).await?;
  Ok(AppState::new(pool, config))
}

/// Start the HTTP server with the configured environment.
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  crate::util::init_tracing();

  let config = Config::from_env()?;
  let state = open_state(&config).await?;
  info!(
    entries = state.query.count().await?,
    database = %config.database_url,
    "log store ready"
  );

  let app = http::build_router(state);

  info!("upload endpoint:  POST http://{}/upload", config.addr);
  info!("query endpoint:   GET  http://{}/logs", config.addr);
  info!("stats endpoint:   GET  http://{}/stats", config.addr);

  let listener = tokio::net::TcpListener::bind(config.addr).await?;
  axum::serve(listener, app).await?;
  Ok(())
}

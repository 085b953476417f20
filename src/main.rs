use logdeck::app::{self, Config};
use std::path::Path;

const USAGE: &str = "Usage: logdeck [--version] [import <file>...]";

#[tokio::main]
async fn main() {
  // Minimal CLI: --version/-V, --help/-h, or `import <file>...`
  let args: Vec<String> = std::env::args().skip(1).collect();
  match args.first().map(String::as_str) {
    None => {}
    Some("--version" | "-V") => {
      println!("logdeck {}", env!("CARGO_PKG_VERSION"));
      return;
    }
    Some("import") => {
      if let Err(e) = import(&args[1..]).await {
        eprintln!("error: {e}");
        std::process::exit(1);
      }
      return;
    }
    Some(_) => {
      eprintln!("{USAGE}");
      return;
    }
  }

  if let Err(e) = app::run().await {
    eprintln!("error: {e}");
    std::process::exit(1);
  }
}

/// Ingest files directly into the configured database, bypassing the
/// upload extension check.
async fn import(paths: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
  if paths.is_empty() {
    return Err(USAGE.into());
  }
  logdeck::util::init_tracing();
  let config = Config::from_env()?;
  let state = app::open_state(&config).await?;
  for path in paths {
    let raw = tokio::fs::read(path).await?;
    let name = Path::new(path)
      .file_name()
      .and_then(|n| n.to_str())
      .unwrap_or(path.as_str());
    let report = state.ingest.ingest_content(name, &raw).await?;
    println!(
      "{path}: inserted {}, skipped {}",
      report.inserted_count, report.skipped_count
    );
  }
  println!("store now holds {} entries", state.query.count().await?);
  Ok(())
}

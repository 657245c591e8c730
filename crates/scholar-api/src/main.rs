//! scholar-api server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `SCHOLAR_*` environment variables, opens the SQLite store, seeds the
//! course catalog and serves the JSON API over HTTP.
//!
//! # Token digests
//!
//! Configured tokens are stored as SHA-256 hex digests. To produce one:
//!
//! ```text
//! cargo run -p scholar-api --bin server -- --hash-token
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use scholar_api::{
  AppState, ServerConfig,
  auth::{StaticIdentityProvider, hash_token},
  seed,
};
use scholar_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Scholar learning platform API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the SHA-256 digest of a token entered on stdin and exit.
  #[arg(long)]
  hash_token: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_token {
    let token = read_stdin_line("Token: ")?;
    println!("{}", hash_token(&token));
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SCHOLAR").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if server_cfg.seed_catalog {
    seed::seed_catalog(&store)
      .await
      .context("failed to seed course catalog")?;
  }
  if server_cfg.tokens.is_empty() {
    tracing::warn!("no tokens configured; every authenticated request will be rejected");
  }

  let identity = Arc::new(StaticIdentityProvider::new(server_cfg.tokens.clone()));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, server_cfg, identity);
  let app = scholar_api::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn read_stdin_line(prompt: &str) -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("{prompt}");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

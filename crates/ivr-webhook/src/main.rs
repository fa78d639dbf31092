//! ivr-webhook server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid by the
//! environment, opens the session directory, and answers provider callbacks
//! over HTTP.
//!
//! ```sh
//! PORT=8080 SUPPORT_PHONES_ENG=+2341000,+2341001 cargo run -p ivr-webhook
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use ivr_store_fs::FsStore;
use ivr_webhook::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "IVR call-flow webhook")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let directory = server_cfg.directory();
  for (department, language) in directory.missing() {
    tracing::warn!(
      %department,
      %language,
      "no destination numbers configured; calls will be forwarded to an empty list"
    );
  }

  let store = FsStore::open(&server_cfg.data_dir)
    .await
    .with_context(|| format!("failed to open data dir {:?}", server_cfg.data_dir))?;

  let state = AppState {
    store:     Arc::new(store),
    directory: Arc::new(directory),
  };

  let app = ivr_webhook::router(state);
  let address = server_cfg.address();

  tracing::info!("Call center listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

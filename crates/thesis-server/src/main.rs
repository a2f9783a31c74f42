//! thesis-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the JSON API or runs a single sync cycle.
//!
//! ```text
//! cargo run -p thesis-server -- --config config.toml sync
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use thesis_server::{ServerConfig, build_state};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Thesis topic tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Default)]
enum Command {
  /// Serve the HTTP API (default).
  #[default]
  Serve,
  /// Run one scrape-and-reconcile cycle, print the counts as JSON and exit.
  Sync,
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

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  let state = build_state(&server_cfg).await?;

  match cli.command.unwrap_or_default() {
    Command::Sync => {
      let report = state.sync.synchronize().await.context("sync failed")?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Command::Serve => {
      let app = thesis_api::app(state).layer(TraceLayer::new_for_http());
      let address = server_cfg.address();

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

      axum::serve(listener, app).await.context("server error")?;
    }
  }

  Ok(())
}

//! Wiring for the thesis tracker server: configuration loading and
//! construction of the shared application state.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use thesis_api::AppState;
use thesis_scrape::{
  Aggregator, HttpLinkValidator, LabConfig, Synchronizer, adapters::labs::builtin_registry,
  fetch::HttpPageFetcher,
};
use thesis_store_sqlite::SqliteStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `THESIS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub store_path:             PathBuf,
  /// Where scrape artifacts are dumped. Unset disables the dump.
  #[serde(default)]
  pub artifact_dir:           Option<PathBuf>,
  #[serde(default = "default_validator_timeout")]
  pub validator_timeout_secs: u64,
  #[serde(default = "default_fetch_timeout")]
  pub fetch_timeout_secs:     u64,
  /// Labs to scrape, in order.
  #[serde(default)]
  pub labs:                   Vec<LabConfig>,
}

fn default_validator_timeout() -> u64 { 5 }

fn default_fetch_timeout() -> u64 { 30 }

impl ServerConfig {
  /// Layer `path` (optional) under `THESIS_*` environment variables.
  /// Nested keys use `__`, e.g. `THESIS_PORT=8080`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("THESIS").separator("__"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Open the store and build the scrape pipeline described by `cfg`.
pub async fn build_state(cfg: &ServerConfig) -> anyhow::Result<AppState<SqliteStore>> {
  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  state_for(Arc::new(store), cfg)
}

fn state_for(store: Arc<SqliteStore>, cfg: &ServerConfig) -> anyhow::Result<AppState<SqliteStore>> {
  let validator = HttpLinkValidator::new(Duration::from_secs(cfg.validator_timeout_secs))
    .context("failed to build link validator")?;
  let fetcher = HttpPageFetcher::new(Duration::from_secs(cfg.fetch_timeout_secs))
    .context("failed to build page fetcher")?;

  let registry = builtin_registry(Arc::new(fetcher));
  tracing::info!(adapters = registry.len(), labs = cfg.labs.len(), "scrape pipeline ready");
  let mut aggregator = Aggregator::new(Arc::new(validator), registry);
  if let Some(dir) = &cfg.artifact_dir {
    aggregator = aggregator.with_artifact_dir(expand_tilde(dir));
  }

  for lab in &cfg.labs {
    if aggregator.registry().get(&lab.name).is_none() {
      tracing::warn!(lab = %lab.name, "configured lab has no adapter and will be skipped");
    }
  }

  let sync = Synchronizer::new(aggregator, store.clone(), cfg.labs.clone());
  Ok(AppState::new(store, sync))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(toml: &str) -> Result<ServerConfig, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  #[test]
  fn defaults_fill_optional_fields() {
    let cfg = parse(
      r#"
        host = "127.0.0.1"
        port = 8000
        store_path = "thesis.db"
      "#,
    )
    .unwrap();

    assert_eq!(cfg.validator_timeout_secs, 5);
    assert_eq!(cfg.fetch_timeout_secs, 30);
    assert!(cfg.artifact_dir.is_none());
    assert!(cfg.labs.is_empty());
    assert_eq!(cfg.address(), "127.0.0.1:8000");
  }

  #[test]
  fn labs_keep_their_order() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 8000
        store_path = "thesis.db"

        [[labs]]
        name = "MAD"
        url = "https://www.mad.tf.fau.de/"

        [[labs]]
        name = "ASM"
        url = "https://www.asm.tf.fau.de/"
      "#,
    )
    .unwrap();

    let names: Vec<&str> = cfg.labs.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["MAD", "ASM"]);
  }

  #[test]
  fn missing_store_path_is_an_error() {
    assert!(parse("host = \"h\"\nport = 1").is_err());
  }

  #[test]
  fn tilde_is_left_alone_without_slash() {
    assert_eq!(expand_tilde(Path::new("~thesis.db")), PathBuf::from("~thesis.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }

  #[tokio::test]
  async fn state_opens_store_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = parse(&format!(
      "host = \"127.0.0.1\"\nport = 1\nstore_path = {:?}\n[[labs]]\nname = \"MAD\"\nurl = \"https://mad\"",
      dir.path().join("t.db").to_string_lossy()
    ))
    .unwrap();

    let state = build_state(&cfg).await.unwrap();

    assert_eq!(state.sync.labs().len(), 1);
    assert!(dir.path().join("t.db").exists());
  }
}

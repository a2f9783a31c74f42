//! Link validation: a single bounded existence check per lab and cycle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

/// Timeout applied to each validation request unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Decides whether a lab's URL is reachable before its adapter runs.
///
/// Implementations never fail: any transport problem means "not reachable".
#[async_trait]
pub trait LinkValidator: Send + Sync {
  async fn is_reachable(&self, url: &str) -> bool;
}

/// Validates links with one `HEAD` request; any status below 400 passes.
#[derive(Clone)]
pub struct HttpLinkValidator {
  client: Client,
}

impl HttpLinkValidator {
  pub fn new(timeout: Duration) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl LinkValidator for HttpLinkValidator {
  async fn is_reachable(&self, url: &str) -> bool {
    match self.client.head(url).send().await {
      Ok(resp) if resp.status().as_u16() < 400 => {
        info!(%url, "link is valid");
        true
      }
      Ok(resp) => {
        warn!(%url, status = resp.status().as_u16(), "link returned error status");
        false
      }
      Err(e) => {
        warn!(%url, error = %e, "HEAD request failed");
        false
      }
    }
  }
}

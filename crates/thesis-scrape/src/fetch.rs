//! Page fetching for source adapters.
//!
//! Section rules work on the markdown rendering of a page. The bundled
//! [`HttpPageFetcher`] converts HTML responses to markdown and passes any
//! other body through unchanged. Pages that only render with JavaScript need
//! a different [`PageFetcher`].

use std::time::Duration;

use async_trait::async_trait;
use htmd::{
  HtmlToMarkdown,
  options::{BulletListMarker, HeadingStyle, Options},
};
use reqwest::{Client, header::CONTENT_TYPE};
use tracing::debug;

use crate::{AdapterError, Result};

#[async_trait]
pub trait PageFetcher: Send + Sync {
  async fn fetch(&self, url: &str) -> Result<String>;
}

/// Render `html` as markdown with ATX headings and `*` bullets, the shape the
/// built-in section rules match against.
pub fn html_to_markdown(html: &str) -> Result<String> {
  HtmlToMarkdown::builder()
    .skip_tags(vec!["script", "style", "noscript"])
    .options(Options {
      heading_style: HeadingStyle::Atx,
      bullet_list_marker: BulletListMarker::Asterisk,
      ..Default::default()
    })
    .build()
    .convert(html)
    .map_err(|e| AdapterError::Parse(format!("html to markdown: {e}")))
}

/// Page text for a response body: HTML is converted, anything else is kept.
pub fn page_text(content_type: Option<&str>, body: String) -> Result<String> {
  match content_type {
    Some(ct) if ct.to_ascii_lowercase().contains("html") => html_to_markdown(&body),
    _ => Ok(body),
  }
}

/// Fetches pages with a plain `GET`.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpPageFetcher {
  client: Client,
}

impl HttpPageFetcher {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
  async fn fetch(&self, url: &str) -> Result<String> {
    let resp = self.client.get(url).send().await?;
    if !resp.status().is_success() {
      return Err(AdapterError::Status {
        url:    url.to_owned(),
        status: resp.status().as_u16(),
      });
    }
    let content_type = resp
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    let body = resp.text().await?;
    debug!(%url, len = body.len(), content_type = ?content_type, "fetched page");
    page_text(content_type.as_deref(), body)
  }
}

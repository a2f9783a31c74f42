//! Declarative section-based source adapters.
//!
//! Most lab pages list their thesis offers as one link per line under a
//! recognisable heading. A [`SectionRule`] captures where that list starts,
//! where it ends, and what an item line looks like; a [`SectionAdapter`]
//! pairs a rule with a [`PageFetcher`].

pub mod labs;

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use thesis_core::snapshot::ScrapedItem;
use tracing::{debug, info, warn};

use crate::{AdapterError, Result, adapter::SourceAdapter, fetch::PageFetcher};

// ─── Rule ────────────────────────────────────────────────────────────────────

/// How to pull `{title, link}` items out of one page's text.
///
/// Matching is line based. Every line is trimmed before it is tested. Heading
/// and stop markers compare by prefix, ignoring case and runs of whitespace,
/// so `##  Foo` and `## foo` are the same marker.
#[derive(Debug, Clone)]
pub struct SectionRule {
  item:            Regex,
  start:           Option<String>,
  stops:           Vec<String>,
  heading_break:   Option<String>,
  table_gate:      bool,
  base_url:        Option<String>,
  excluded_titles: Vec<String>,
}

impl SectionRule {
  /// `item_pattern` must define the named groups `title` and `link`.
  pub fn new(item_pattern: &str) -> Result<Self> {
    let item = Regex::new(item_pattern).map_err(|e| AdapterError::Parse(e.to_string()))?;
    let names: Vec<&str> = item.capture_names().flatten().collect();
    if !names.contains(&"title") || !names.contains(&"link") {
      return Err(AdapterError::Parse(format!(
        "item pattern {item_pattern:?} needs `title` and `link` groups"
      )));
    }
    Ok(Self {
      item,
      start: None,
      stops: Vec::new(),
      heading_break: None,
      table_gate: false,
      base_url: None,
      excluded_titles: Vec::new(),
    })
  }

  /// Only consider lines after the first one starting with `heading`.
  pub fn starting_at(mut self, heading: &str) -> Self {
    self.start = Some(squash(heading));
    self
  }

  /// End the section at the first line starting with `marker`.
  pub fn stopping_at(mut self, marker: &str) -> Self {
    self.stops.push(squash(marker));
    self
  }

  /// End the section at a line starting with `prefix` that is not itself an
  /// item.
  pub fn breaking_on_heading(mut self, prefix: &str) -> Self {
    self.heading_break = Some(prefix.to_owned());
    self
  }

  /// Skip ahead to the first table row (a line containing `|`, other than a
  /// bare `---|---` separator) before collecting items.
  pub fn after_table_delimiter(mut self) -> Self {
    self.table_gate = true;
    self
  }

  /// Join relative links onto `base`.
  pub fn resolving_against(mut self, base: &str) -> Self {
    self.base_url = Some(base.to_owned());
    self
  }

  pub fn excluding(mut self, titles: &[&str]) -> Self {
    self.excluded_titles.extend(titles.iter().map(|t| (*t).to_owned()));
    self
  }

  /// Extract items from `text`. Never fails: a page without the expected
  /// structure yields an empty list.
  pub fn extract(&self, text: &str) -> Vec<ScrapedItem> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut from = 0;

    if let Some(start) = &self.start {
      match lines.iter().position(|l| squash(l).starts_with(start)) {
        Some(i) => from = i + 1,
        None => {
          warn!(heading = %start, "section heading not found");
          return Vec::new();
        }
      }
    }

    if self.table_gate {
      let gate = lines[from..]
        .iter()
        .position(|l| *l != "---|---" && l.contains('|'));
      match gate {
        Some(i) => from += i + 1,
        None => {
          warn!("no table delimiter found in section");
          return Vec::new();
        }
      }
    }

    let mut items = Vec::new();
    for line in &lines[from..] {
      let squashed = squash(line);
      if self.stops.iter().any(|s| squashed.starts_with(s)) {
        break;
      }

      let caps = self.item.captures(line);
      if let Some(prefix) = &self.heading_break
        && line.starts_with(prefix.as_str())
        && caps.is_none()
      {
        break;
      }
      let Some(caps) = caps else { continue };

      let title = caps["title"].trim();
      if self.excluded_titles.iter().any(|t| t == title) {
        continue;
      }
      let link = self.resolve(strip_tooltip(caps["link"].trim()));
      items.push(ScrapedItem::new(title, link));
    }
    items
  }

  fn resolve(&self, link: &str) -> String {
    let Some(base) = &self.base_url else {
      return link.to_owned();
    };
    match Url::parse(base).and_then(|b| b.join(link)) {
      Ok(url) => url.to_string(),
      Err(e) => {
        debug!(%base, %link, error = %e, "could not resolve link; keeping it as-is");
        link.to_owned()
      }
    }
  }
}

/// Lowercase `s` and collapse whitespace runs to single spaces.
fn squash(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Drop a markdown link title: `https://x "Tooltip"` → `https://x`.
fn strip_tooltip(link: &str) -> &str {
  match link.split_once(" \"") {
    Some((url, _)) => url.trim_end(),
    None => link,
  }
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

/// A [`SourceAdapter`] that fetches a page and applies a [`SectionRule`].
pub struct SectionAdapter {
  lab:     String,
  rule:    SectionRule,
  fetcher: Arc<dyn PageFetcher>,
}

impl SectionAdapter {
  pub fn new(lab: impl Into<String>, rule: SectionRule, fetcher: Arc<dyn PageFetcher>) -> Self {
    Self { lab: lab.into(), rule, fetcher }
  }
}

#[async_trait]
impl SourceAdapter for SectionAdapter {
  async fn scrape(&self, url: &str) -> Result<Vec<ScrapedItem>> {
    info!(lab = %self.lab, %url, "scraping lab page");
    let text = self.fetcher.fetch(url).await?;
    let items = self.rule.extract(&text);
    info!(lab = %self.lab, count = items.len(), "extracted thesis items");
    Ok(items)
  }
}

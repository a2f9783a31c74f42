//! Section rules for the labs the tracker ships with.
//!
//! The rules expect the markdown rendering of each lab page, which is what the
//! page fetcher is responsible for producing.

use std::sync::Arc;

use super::{SectionAdapter, SectionRule};
use crate::{adapter::AdapterRegistry, fetch::PageFetcher};

/// Markdown link on a line of its own: `[Title](link)`.
const BARE_LINK: &str = r"^\[(?P<title>.*?)\]\((?P<link>.*?)\)";

/// Markdown bullet link: `* [Title](link "optional tooltip")`.
const BULLET_LINK: &str = r"^\*\s+\[(?P<title>.*?)\]\((?P<link>[^)]+)\)";

fn rule(pattern: &str) -> SectionRule {
  SectionRule::new(pattern).expect("valid regex")
}

/// Chair of Applied Dynamics: `##### [Title](link)` under "Master's Thesis".
pub fn mad() -> SectionRule {
  rule(r"^##### \[(?P<title>.*?)\]\((?P<link>.*?)\)")
    .starting_at("##  Master's Thesis")
    .breaking_on_heading("## ")
    .resolving_against("https://www.mad.tf.fau.de/")
}

/// Chair of Applied Mechanics: `## [Title](link)` under "Masterarbeiten".
pub fn asm() -> SectionRule {
  rule(r"^## \[(?P<title>.*?)\]\((?P<link>.*?)\)")
    .starting_at("##  Masterarbeiten")
    .stopping_at("##  Bachelorarbeiten")
    .breaking_on_heading("## ")
    .resolving_against("https://www.asm.tf.fau.de/")
}

/// Chair of Fluid Mechanics: bullets under "Advertised Thesis Subjects".
pub fn lstm() -> SectionRule {
  rule(BULLET_LINK)
    .starting_at("##  Advertised Thesis Subjects")
    .stopping_at("**Assigned Subjects**")
    .breaking_on_heading("## ")
}

/// Chair of Automatic Control: `* Thesis: [..](..)` bullets anywhere.
pub fn automatic_control() -> SectionRule {
  rule(r"^\*\s+(?:Thesis\s*/\s*Project|Thesis):\s+\[(?P<title>.*?)\]\((?P<link>[^)]+)\)")
}

/// i-MEET: bare links from "MSc Theses" up to the Crystal Growth Lab group.
pub fn i_meet() -> SectionRule {
  rule(BARE_LINK)
    .starting_at("# MSc Theses")
    .stopping_at("### Research group of Prof. Wellmann (CGL (Crystal Growth Lab))")
    .resolving_against("https://www.i-meet.ww.uni-erlangen.de/")
}

/// Chair of Information Systems I: bullets after the offerings table.
pub fn information_systems() -> SectionRule {
  rule(r"^\*\s+\[(?P<title>.*?)\]\((?P<link>.*?)\)$")
    .starting_at("## Master Thesis Offerings")
    .after_table_delimiter()
    .breaking_on_heading("## ")
    .excluding(&[
      "Contact & Address",
      "Jobs",
      "Privacy",
      "Accessibility",
      "Imprint",
      "Facebook",
      "Twitter",
      "RSS Feed",
    ])
}

/// Registry with every built-in lab, keyed by its configured lab name.
pub fn builtin_registry(fetcher: Arc<dyn PageFetcher>) -> AdapterRegistry {
  let rules = [
    ("MAD", mad()),
    ("ASM", asm()),
    ("LSTM", lstm()),
    ("AC", automatic_control()),
    ("I-Meet", i_meet()),
    ("IIVC", information_systems()),
  ];

  let mut registry = AdapterRegistry::new();
  for (name, rule) in rules {
    registry.register(name, Arc::new(SectionAdapter::new(name, rule, fetcher.clone())));
  }
  registry
}

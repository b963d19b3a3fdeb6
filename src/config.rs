// src/config.rs
// =============================================================================
// All tunables of an audit in one place.
//
// Defaults are sensible for a quick audit of a typical site. A JSON file can
// override any subset of fields (missing fields keep their default), and CLI
// flags override the file.
//
// Example config file:
//   {
//     "concurrency": 10,
//     "max_sample": 50,
//     "crawlers": [{ "name": "GPTBot", "user_agent": "... GPTBot/1.1 ..." }]
//   }
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A crawler identity we audit access for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlerProfile {
    /// Short name, e.g. "GPTBot"
    pub name: String,
    /// The User-Agent sent when probing as this crawler. Also the identity
    /// robots.txt groups are matched against.
    pub user_agent: String,
}

impl CrawlerProfile {
    pub fn new(name: &str, user_agent: &str) -> Self {
        CrawlerProfile {
            name: name.to_string(),
            user_agent: user_agent.to_string(),
        }
    }
}

/// The crawlers tracked when no config says otherwise
pub fn default_crawlers() -> Vec<CrawlerProfile> {
    vec![
        CrawlerProfile::new(
            "Googlebot",
            "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        ),
        CrawlerProfile::new(
            "Bingbot",
            "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
        ),
        CrawlerProfile::new(
            "GPTBot",
            "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko); compatible; GPTBot/1.1; +https://openai.com/gptbot",
        ),
        CrawlerProfile::new(
            "ClaudeBot",
            "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; ClaudeBot/1.0; +claudebot@anthropic.com)",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Timeout for robots.txt and the per-crawler root requests
    pub document_timeout_ms: u64,
    /// Timeout for each sampled page and each sitemap document
    pub probe_timeout_ms: u64,
    /// Timeout for each sitemap discovery candidate
    pub discovery_timeout_ms: u64,
    /// Maximum number of page probes in flight at once
    pub concurrency: usize,
    /// Maximum number of sitemap documents fetched in one traversal
    pub max_sitemap_documents: usize,
    /// Maximum number of page URLs sampled
    pub max_sample: usize,
    /// Pause between root requests made as different crawlers
    pub identity_pacing_ms: u64,
    /// User-Agent for requests that are not made as a tracked crawler
    pub user_agent: String,
    pub crawlers: Vec<CrawlerProfile>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            document_timeout_ms: 5_000,
            probe_timeout_ms: 10_000,
            discovery_timeout_ms: 5_000,
            concurrency: 5,
            max_sitemap_documents: 20,
            max_sample: 25,
            identity_pacing_ms: 250,
            user_agent: format!("crawl-audit/{}", env!("CARGO_PKG_VERSION")),
            crawlers: default_crawlers(),
        }
    }
}

impl AuditConfig {
    /// Reads a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AuditConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Clamps counts that must be at least one
    pub fn normalized(mut self) -> Self {
        self.concurrency = self.concurrency.max(1);
        self.max_sample = self.max_sample.max(1);
        self.max_sitemap_documents = self.max_sitemap_documents.max(1);
        self
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_millis(self.document_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn identity_pacing(&self) -> Duration {
        Duration::from_millis(self.identity_pacing_ms)
    }
}

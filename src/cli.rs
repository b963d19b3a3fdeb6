// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Subcommands:
// - audit: full crawlability audit of a site
// - robots: ask a site's robots.txt about one agent and path
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AuditConfig;

#[derive(Parser, Debug)]
#[command(
    name = "crawl-audit",
    version,
    about = "Audit how crawlable a website is for search and AI bots",
    long_about = "crawl-audit checks a site's robots.txt for well-known search and AI crawlers, \
                  requests the home page as each of them, walks the sitemap to sample pages, \
                  and reports the indexability signals it finds on those pages."
)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full audit of a website
    ///
    /// Example: crawl-audit audit example.com --max-sample 50
    Audit {
        /// Site to audit (e.g., example.com or https://example.com)
        target: String,

        /// Output the report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// JSON config file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum number of page probes in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Maximum number of pages sampled from the sitemap
        #[arg(long)]
        max_sample: Option<usize>,

        /// Maximum number of sitemap files to read
        #[arg(long)]
        max_sitemaps: Option<usize>,

        /// Timeout in seconds for each page probe
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Check what robots.txt says about one agent and path
    ///
    /// Example: crawl-audit robots example.com --agent GPTBot --path /blog
    Robots {
        /// Site whose robots.txt to read
        target: String,

        /// User-agent string (or bot token) to evaluate
        #[arg(long)]
        agent: String,

        /// Path to check
        #[arg(long, default_value = "/")]
        path: String,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Flag values that override the loaded config
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub concurrency: Option<usize>,
    pub max_sample: Option<usize>,
    pub max_sitemaps: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, mut config: AuditConfig) -> AuditConfig {
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(n) = self.max_sample {
            config.max_sample = n;
        }
        if let Some(n) = self.max_sitemaps {
            config.max_sitemap_documents = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.probe_timeout_ms = secs.saturating_mul(1000);
        }
        config
    }
}

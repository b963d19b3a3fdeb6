// src/audit/report.rs
// =============================================================================
// The audit report and the builder that assembles it.
//
// Each audit step hands its finished result to the builder exactly once.
// Page probes never write into a shared report: their results are gathered
// first and passed in as a whole. `build()` then derives the health counts,
// the missing schema list and the recommendations.
// =============================================================================

use serde::Serialize;

use super::summary::recommendations;
use crate::classify::{PageClassification, PlatformDetection, RobotsDirectives};
use crate::probe::ProbeFailure;
use crate::sitemap::SitemapEntry;

/// Schema types every site is expected to expose somewhere
pub const EXPECTED_SCHEMAS: &[&str] = &["Organization", "WebSite", "FAQPage", "HowTo", "Article"];

/// What robots.txt looked like
#[derive(Debug, Clone, Default, Serialize)]
pub struct RobotsSummary {
    /// False when the document was missing, non-2xx or not text
    pub found: bool,
    pub status: Option<u16>,
    pub sitemap_hints: Vec<String>,
    pub groups: Vec<GroupSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub agents: Vec<String>,
    pub rules: usize,
}

/// How one tracked crawler is treated by the site
#[derive(Debug, Clone, Serialize)]
pub struct CrawlerAccess {
    pub name: String,
    pub user_agent: String,
    pub allowed_by_robots: bool,
    /// The robots.txt rule that decided access to "/", e.g. "Disallow: /"
    pub matched_rule: Option<String>,
    pub disallowed_patterns: Vec<String>,
    /// Status of the root page requested as this crawler
    pub root_status: Option<u16>,
    pub root_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_robots_tag: Option<String>,
}

impl CrawlerAccess {
    /// The server (or something in front of it) refused this crawler
    pub fn blocked_at_edge(&self) -> bool {
        matches!(self.root_status, Some(401 | 403 | 429))
    }
}

/// Where the sampled URLs came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSource {
    Sitemap,
    Root,
}

/// The result of probing and classifying one sampled page
#[derive(Debug, Clone, Serialize)]
pub struct PageAudit {
    pub url: String,
    pub status: Option<u16>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_robots_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<PageClassification>,
    /// Tracked crawlers that robots.txt keeps away from this page
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disallowed_for: Vec<String>,
}

impl PageAudit {
    /// Marked noindex by meta tag or by X-Robots-Tag header
    pub fn noindex(&self) -> bool {
        self.classification.as_ref().is_some_and(|c| c.noindex) || self.header_directives().noindex
    }

    pub fn nofollow(&self) -> bool {
        self.classification.as_ref().is_some_and(|c| c.nofollow)
            || self.header_directives().nofollow
    }

    fn header_directives(&self) -> RobotsDirectives {
        self.x_robots_tag
            .as_deref()
            .map(RobotsDirectives::parse)
            .unwrap_or_default()
    }
}

/// Counts over the sampled pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampleHealth {
    pub sampled: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub noindex: usize,
    pub nofollow: usize,
    pub with_structured_data: usize,
    pub rich_result_eligible: usize,
    /// Pages robots.txt disallows for at least one tracked crawler
    pub disallowed: usize,
}

impl SampleHealth {
    pub fn from_pages(pages: &[PageAudit]) -> Self {
        let mut health = SampleHealth {
            sampled: pages.len(),
            ..Default::default()
        };
        for page in pages {
            if page.success {
                health.succeeded += 1;
            } else {
                health.failed += 1;
            }
            if page.noindex() {
                health.noindex += 1;
            }
            if page.nofollow() {
                health.nofollow += 1;
            }
            if !page.disallowed_for.is_empty() {
                health.disallowed += 1;
            }
            if let Some(c) = &page.classification {
                if !c.structured_data_types.is_empty() {
                    health.with_structured_data += 1;
                }
                if c.rich_result_eligible {
                    health.rich_result_eligible += 1;
                }
            }
        }
        health
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub target: String,
    pub origin: String,
    pub robots: RobotsSummary,
    pub crawlers: Vec<CrawlerAccess>,
    pub platform: PlatformDetection,
    pub sitemaps: Vec<SitemapEntry>,
    pub sample_source: SampleSource,
    pub pages: Vec<PageAudit>,
    pub health: SampleHealth,
    pub missing_schemas: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AuditReport {
    /// Something stops at least one crawler from indexing the site
    pub fn has_blockers(&self) -> bool {
        self.crawlers
            .iter()
            .any(|c| !c.allowed_by_robots || c.blocked_at_edge())
            || self.health.noindex > 0
    }
}

/// Collects step results, then derives the rest of the report
#[derive(Debug)]
pub struct ReportBuilder {
    target: String,
    origin: String,
    robots: RobotsSummary,
    crawlers: Vec<CrawlerAccess>,
    platform: PlatformDetection,
    sitemaps: Vec<SitemapEntry>,
    sample_source: SampleSource,
    pages: Vec<PageAudit>,
}

impl ReportBuilder {
    pub fn new(target: &str, origin: &str) -> Self {
        ReportBuilder {
            target: target.to_string(),
            origin: origin.to_string(),
            robots: RobotsSummary::default(),
            crawlers: Vec::new(),
            platform: PlatformDetection::default(),
            sitemaps: Vec::new(),
            sample_source: SampleSource::Root,
            pages: Vec::new(),
        }
    }

    pub fn robots(mut self, robots: RobotsSummary) -> Self {
        self.robots = robots;
        self
    }

    pub fn crawlers(mut self, crawlers: Vec<CrawlerAccess>, platform: PlatformDetection) -> Self {
        self.crawlers = crawlers;
        self.platform = platform;
        self
    }

    pub fn sitemaps(mut self, sitemaps: Vec<SitemapEntry>, source: SampleSource) -> Self {
        self.sitemaps = sitemaps;
        self.sample_source = source;
        self
    }

    pub fn pages(mut self, pages: Vec<PageAudit>) -> Self {
        self.pages = pages;
        self
    }

    pub fn build(self) -> AuditReport {
        let health = SampleHealth::from_pages(&self.pages);
        let missing_schemas = missing_schemas(&self.pages);

        let mut report = AuditReport {
            target: self.target,
            origin: self.origin,
            robots: self.robots,
            crawlers: self.crawlers,
            platform: self.platform,
            sitemaps: self.sitemaps,
            sample_source: self.sample_source,
            pages: self.pages,
            health,
            missing_schemas,
            recommendations: Vec::new(),
        };
        report.recommendations = recommendations(&report);
        report
    }
}

// Expected schema types that no sampled page declared
fn missing_schemas(pages: &[PageAudit]) -> Vec<String> {
    EXPECTED_SCHEMAS
        .iter()
        .filter(|expected| {
            !pages
                .iter()
                .filter_map(|p| p.classification.as_ref())
                .any(|c| c.structured_data_types.iter().any(|t| t == *expected))
        })
        .map(|s| s.to_string())
        .collect()
}

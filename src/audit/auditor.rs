// src/audit/auditor.rs
// =============================================================================
// Runs one complete audit of a target origin.
//
// Steps (each one bounded by its own timeout):
// 1. Fetch /robots.txt and build the policy (missing -> allow everything)
// 2. Ask the policy whether each tracked crawler may fetch "/"
// 3. Request the home page once per crawler, pausing between identities
// 4. Discover sitemaps and walk the first confirmed one into a URL sample
//    (no sitemap -> the sample is just the home page)
// 5. Probe every sampled URL through the bounded executor and classify it,
//    noting which crawlers robots.txt keeps off each page
// 6. Assemble the report
//
// Failed requests in any step just produce an empty result for that step.
// Only a bad target or a crashed probe task fails the whole audit.
// =============================================================================

use std::sync::Arc;
use tracing::{debug, info, warn};
use url::{Position, Url};

use super::report::{
    AuditReport, CrawlerAccess, GroupSummary, PageAudit, ReportBuilder, RobotsSummary, SampleSource,
};
use super::AuditError;
use crate::classify::{
    ContentClassifier, HtmlClassifier, PlatformDetection, PlatformDetector, SignatureDetector,
};
use crate::config::{AuditConfig, CrawlerProfile};
use crate::executor::Executor;
use crate::probe::{HttpProber, Probe, ProbeRequest, ProbeResult};
use crate::robots::{Policy, ROBOTS_PATH};
use crate::sitemap::{CrawlSettings, SitemapCrawler, SitemapEntry};

pub struct Auditor {
    config: AuditConfig,
    prober: Arc<dyn Probe>,
    classifier: Arc<dyn ContentClassifier>,
    detector: Arc<dyn PlatformDetector>,
}

impl Auditor {
    /// An auditor with the real HTTP prober and the default classifiers
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let prober = HttpProber::new().map_err(|e| AuditError::Client(e.to_string()))?;
        let classifier = HtmlClassifier::new(config.crawlers.iter().map(|c| c.name.as_str()));
        Ok(Self::with_parts(
            config,
            Arc::new(prober),
            Arc::new(classifier),
            Arc::new(SignatureDetector),
        ))
    }

    pub fn with_parts(
        config: AuditConfig,
        prober: Arc<dyn Probe>,
        classifier: Arc<dyn ContentClassifier>,
        detector: Arc<dyn PlatformDetector>,
    ) -> Self {
        Auditor {
            config: config.normalized(),
            prober,
            classifier,
            detector,
        }
    }

    pub async fn audit(&self, target: &str) -> Result<AuditReport, AuditError> {
        let origin = normalize_target(target)?;
        info!("auditing {}", origin);

        let (policy, robots) = self.fetch_policy(&origin).await;
        let (crawlers, platform) = self.profile_crawlers(&origin, &policy).await;
        let (sitemaps, source, sample) = self.sample_urls(&origin, &policy).await;
        let mut pages = self.probe_sample(sample).await?;
        mark_disallowed(&mut pages, &policy, &self.config.crawlers);

        Ok(ReportBuilder::new(target, origin.as_str())
            .robots(robots)
            .crawlers(crawlers, platform)
            .sitemaps(sitemaps, source)
            .pages(pages)
            .build())
    }

    /// Fetches and parses robots.txt. Anything but a 2xx plain-text response
    /// is treated as "no policy".
    pub async fn fetch_policy(&self, origin: &Url) -> (Policy, RobotsSummary) {
        let Ok(robots_url) = origin.join(ROBOTS_PATH) else {
            return (Policy::default(), RobotsSummary::default());
        };

        let result = self
            .prober
            .probe(ProbeRequest::get(
                robots_url.as_str(),
                &self.config.user_agent,
                self.config.document_timeout(),
            ))
            .await;

        if !is_text_document(&result) {
            info!("no usable robots.txt (status {:?})", result.status);
            return (
                Policy::default(),
                RobotsSummary {
                    status: result.status,
                    ..Default::default()
                },
            );
        }

        let policy = Policy::parse(&result.text());
        let summary = RobotsSummary {
            found: true,
            status: result.status,
            sitemap_hints: policy.sitemaps().to_vec(),
            groups: policy
                .groups()
                .iter()
                .map(|g| GroupSummary {
                    agents: g.agent_labels(),
                    rules: g.rules.len(),
                })
                .collect(),
        };
        info!(
            "robots.txt has {} group(s) and {} sitemap hint(s)",
            summary.groups.len(),
            summary.sitemap_hints.len()
        );
        (policy, summary)
    }

    // Policy verdict plus a home page request for every tracked crawler.
    // Requests are sequential with a pause in between so the target does not
    // see a burst of differently-identified hits.
    async fn profile_crawlers(
        &self,
        origin: &Url,
        policy: &Policy,
    ) -> (Vec<CrawlerAccess>, PlatformDetection) {
        let mut crawlers = Vec::with_capacity(self.config.crawlers.len());
        let mut platform = PlatformDetection::default();

        for (i, profile) in self.config.crawlers.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.identity_pacing()).await;
            }

            let verdict = policy.evaluate(&profile.user_agent, "/");
            let root = self.fetch_root_as(origin, &profile.user_agent).await;
            platform = platform.merge(self.detector.detect(&root.headers));

            debug!(
                "{}: robots {} / root status {:?}",
                profile.name,
                if verdict.allowed { "allowed" } else { "disallowed" },
                root.status
            );

            crawlers.push(CrawlerAccess {
                name: profile.name.clone(),
                user_agent: profile.user_agent.clone(),
                allowed_by_robots: verdict.allowed,
                matched_rule: verdict.rule.map(|r| r.to_string()),
                disallowed_patterns: policy.disallowed_patterns(&profile.user_agent),
                root_status: root.status,
                root_reachable: root.success,
                x_robots_tag: root.header("x-robots-tag").map(str::to_string),
            });
        }

        (crawlers, platform)
    }

    // HEAD request for the home page, falling back to GET when the server
    // does not support HEAD
    async fn fetch_root_as(&self, origin: &Url, user_agent: &str) -> ProbeResult {
        let timeout = self.config.document_timeout();
        let result = self
            .prober
            .probe(ProbeRequest::head(origin.as_str(), user_agent, timeout))
            .await;

        if matches!(result.status, Some(405 | 501)) {
            debug!("HEAD not supported by {}, using GET", origin);
            return self
                .prober
                .probe(ProbeRequest::get(origin.as_str(), user_agent, timeout))
                .await;
        }
        result
    }

    // Chooses the URLs to probe: sitemap pages if a sitemap is found,
    // otherwise just the home page
    async fn sample_urls(
        &self,
        origin: &Url,
        policy: &Policy,
    ) -> (Vec<SitemapEntry>, SampleSource, Vec<String>) {
        let crawler = SitemapCrawler::new(
            Arc::clone(&self.prober),
            CrawlSettings {
                user_agent: self.config.user_agent.clone(),
                discovery_timeout: self.config.discovery_timeout(),
                fetch_timeout: self.config.probe_timeout(),
                max_documents: self.config.max_sitemap_documents,
            },
        );

        let sitemaps = crawler.discover(origin, policy.sitemaps()).await;
        info!("{} sitemap(s) confirmed", sitemaps.len());

        if let Some(first) = sitemaps.first() {
            let urls = crawler.collect(&first.url, self.config.max_sample).await;
            if !urls.is_empty() {
                return (sitemaps, SampleSource::Sitemap, urls);
            }
            warn!("sitemap {} listed no pages, sampling the home page instead", first.url);
        }

        (sitemaps, SampleSource::Root, vec![origin.to_string()])
    }

    // Fans the sample out over the executor and gathers the results in
    // sample order
    async fn probe_sample(&self, urls: Vec<String>) -> Result<Vec<PageAudit>, AuditError> {
        let executor = Executor::new(self.config.concurrency);
        info!(
            "probing {} sampled URL(s), {} at a time",
            urls.len(),
            executor.limit()
        );

        let handles: Vec<_> = urls
            .into_iter()
            .map(|url| {
                let prober = Arc::clone(&self.prober);
                let classifier = Arc::clone(&self.classifier);
                let request =
                    ProbeRequest::get(url, &self.config.user_agent, self.config.probe_timeout());
                executor.schedule(async move {
                    let result = prober.probe(request).await;
                    audit_page(result, classifier.as_ref())
                })
            })
            .collect();
        debug!(
            "{} probe(s) running, {} queued",
            executor.active(),
            executor.queued()
        );

        let mut pages = Vec::with_capacity(handles.len());
        for handle in handles {
            let page = handle
                .await
                .map_err(|e| AuditError::TaskFailed(e.to_string()))?;
            pages.push(page);
        }
        Ok(pages)
    }
}

// Classifies a successful page body; failed probes carry no classification
fn audit_page(result: ProbeResult, classifier: &dyn ContentClassifier) -> PageAudit {
    let classification = if result.success && result.body.is_some() {
        Some(classifier.classify(&result.text()))
    } else {
        None
    };

    PageAudit {
        x_robots_tag: result.header("x-robots-tag").map(str::to_string),
        url: result.url,
        status: result.status,
        success: result.success,
        failure: result.failure,
        classification,
        disallowed_for: Vec::new(),
    }
}

// Records, per page, which tracked crawlers robots.txt keeps off its path
fn mark_disallowed(pages: &mut [PageAudit], policy: &Policy, crawlers: &[CrawlerProfile]) {
    for page in pages {
        let Ok(url) = Url::parse(&page.url) else {
            continue;
        };
        let path = &url[Position::BeforePath..Position::AfterQuery];
        page.disallowed_for = crawlers
            .iter()
            .filter(|c| !policy.is_allowed(&c.user_agent, path))
            .map(|c| c.name.clone())
            .collect();
    }
}

// 2xx with a text/plain (or unspecified) content type. Sites that answer
// every path with an HTML page would otherwise be parsed as robots.txt.
fn is_text_document(result: &ProbeResult) -> bool {
    let is_2xx = result.status.is_some_and(|s| (200..300).contains(&s));
    let is_text = result
        .header("content-type")
        .map_or(true, |ct| ct.trim().to_lowercase().starts_with("text/plain"));
    is_2xx && is_text && result.body.is_some()
}

/// Turns user input ("example.com", "https://example.com/some/page?q=1")
/// into the site origin ("https://example.com/")
pub fn normalize_target(target: &str) -> Result<Url, AuditError> {
    let invalid = |reason: &str| AuditError::InvalidTarget {
        target: target.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(invalid("target is empty"));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("only http and https are supported"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("no host"));
    }

    url.join("/").map_err(|e| invalid(&e.to_string()))
}

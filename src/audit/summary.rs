// src/audit/summary.rs
// Plain-language recommendations derived from a finished report.

use super::report::{AuditReport, SampleSource};

pub fn recommendations(report: &AuditReport) -> Vec<String> {
    let mut out = Vec::new();

    for crawler in &report.crawlers {
        if !crawler.allowed_by_robots {
            let rule = crawler.matched_rule.as_deref().unwrap_or("a Disallow rule");
            out.push(format!(
                "{} is blocked from the home page by robots.txt ({}). Remove or narrow the rule if you want it to crawl the site.",
                crawler.name, rule
            ));
        }
        if crawler.blocked_at_edge() {
            if let Some(status) = crawler.root_status {
                out.push(format!(
                    "{} receives HTTP {} for the home page. Check firewall, CDN or bot-management rules.",
                    crawler.name, status
                ));
            }
        }
    }

    if report.platform.detected {
        out.push(format!(
            "Bot protection detected ({}). Make sure verified search and AI crawlers are allow-listed.",
            report.platform.indicators.join(", ")
        ));
    }

    if !report.robots.found {
        out.push("No robots.txt found. Add one to state crawler access explicitly and to list your sitemap.".to_string());
    }

    if report.sitemaps.is_empty() {
        out.push("No sitemap found. Publish a sitemap.xml and reference it from robots.txt.".to_string());
    } else if report.sample_source == SampleSource::Root {
        out.push(format!(
            "Sitemap {} was found but lists no page URLs. Make sure it (or the sitemaps it points to) contains <url><loc> entries.",
            report.sitemaps[0].url
        ));
    }

    let health = &report.health;
    if health.noindex > 0 {
        out.push(format!(
            "{} of {} sampled page(s) are marked noindex and will be kept out of search and AI indexes.",
            health.noindex, health.sampled
        ));
    }
    if health.nofollow > 0 {
        out.push(format!(
            "{} of {} sampled page(s) are marked nofollow, so crawlers will not follow their links.",
            health.nofollow, health.sampled
        ));
    }
    if health.disallowed > 0 {
        out.push(format!(
            "{} of {} sampled page(s) are disallowed by robots.txt for at least one tracked crawler.",
            health.disallowed, health.sampled
        ));
    }
    if health.failed > 0 {
        out.push(format!(
            "{} of {} sampled page(s) could not be fetched successfully.",
            health.failed, health.sampled
        ));
    }

    if !report.missing_schemas.is_empty() {
        out.push(format!(
            "Consider adding structured data for: {}.",
            report.missing_schemas.join(", ")
        ));
    }

    out
}

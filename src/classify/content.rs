// src/classify/content.rs
// =============================================================================
// Classifies a fetched HTML page's indexability signals.
//
// We use the `scraper` crate to find:
// - <meta name="robots" content="..."> and bot-specific variants such as
//   <meta name="gptbot" content="noindex">
// - <script type="application/ld+json"> blocks (parsed with serde_json)
// - microdata: elements with itemscope / itemtype
//
// Broken markup or broken JSON is skipped, never reported as an error.
// =============================================================================

use scraper::{Html, Selector};
use std::sync::OnceLock;

use super::directives::RobotsDirectives;
use super::structured::collect_types;
use super::{ContentClassifier, PageClassification};

/// schema.org types that can produce rich results in search
pub const RICH_RESULT_TYPES: &[&str] = &[
    "Article",
    "NewsArticle",
    "BlogPosting",
    "Product",
    "Recipe",
    "FAQPage",
    "HowTo",
    "Event",
    "JobPosting",
    "Review",
    "BreadcrumbList",
    "VideoObject",
    "LocalBusiness",
    "Course",
];

static META: OnceLock<Selector> = OnceLock::new();
static JSON_LD: OnceLock<Selector> = OnceLock::new();
static ITEMSCOPE: OnceLock<Selector> = OnceLock::new();
static ITEMTYPE: OnceLock<Selector> = OnceLock::new();

// The selectors are constants and known to be valid
fn meta_selector() -> &'static Selector {
    META.get_or_init(|| Selector::parse("meta[name][content]").unwrap())
}

fn json_ld_selector() -> &'static Selector {
    JSON_LD.get_or_init(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap())
}

fn itemscope_selector() -> &'static Selector {
    ITEMSCOPE.get_or_init(|| Selector::parse("[itemscope]").unwrap())
}

fn itemtype_selector() -> &'static Selector {
    ITEMTYPE.get_or_init(|| Selector::parse("[itemtype]").unwrap())
}

/// The default classifier, based on scraper's HTML parser
#[derive(Debug, Clone)]
pub struct HtmlClassifier {
    // Lower-cased <meta name> values that carry robots directives
    meta_names: Vec<String>,
}

impl HtmlClassifier {
    /// `bot_names` adds bot-specific meta names on top of "robots"
    pub fn new<I, S>(bot_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut meta_names = vec!["robots".to_string()];
        for name in bot_names {
            let name = name.as_ref().to_lowercase();
            if !meta_names.contains(&name) {
                meta_names.push(name);
            }
        }
        HtmlClassifier { meta_names }
    }
}

impl Default for HtmlClassifier {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

impl ContentClassifier for HtmlClassifier {
    fn classify(&self, html: &str) -> PageClassification {
        let document = Html::parse_document(html);
        let mut record = PageClassification::default();

        // Meta robots directives
        let mut directives = Vec::new();
        for element in document.select(meta_selector()) {
            let name = element.value().attr("name").unwrap_or("").to_lowercase();
            if !self.meta_names.contains(&name) {
                continue;
            }
            if let Some(content) = element.value().attr("content") {
                directives.push(content.trim().to_string());
            }
        }
        let flags = directives
            .iter()
            .map(|d| RobotsDirectives::parse(d))
            .fold(RobotsDirectives::default(), RobotsDirectives::merge);
        record.noindex = flags.noindex;
        record.nofollow = flags.nofollow;
        if !directives.is_empty() {
            record.robots_meta = Some(directives.join(", "));
        }

        // JSON-LD blocks
        for script in document.select(json_ld_selector()) {
            let text: String = script.text().collect();
            match serde_json::from_str::<serde_json::Value>(text.trim()) {
                Ok(value) => {
                    record.json_ld_blocks += 1;
                    collect_types(&value, &mut record.structured_data_types);
                }
                Err(_) => continue, // Malformed block, skip it
            }
        }

        // Microdata
        record.microdata = document.select(itemscope_selector()).next().is_some();
        for element in document.select(itemtype_selector()) {
            let Some(types) = element.value().attr("itemtype") else {
                continue;
            };
            for type_url in types.split_whitespace() {
                let name = type_url.trim_end_matches('/').rsplit('/').next().unwrap_or("");
                if !name.is_empty() && !record.structured_data_types.iter().any(|t| t == name) {
                    record.structured_data_types.push(name.to_string());
                }
            }
        }

        record.rich_result_eligible = record
            .structured_data_types
            .iter()
            .any(|t| RICH_RESULT_TYPES.contains(&t.as_str()));

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_page_is_indexable() {
        let record = HtmlClassifier::default().classify("<html><head><title>Hi</title></head></html>");
        assert!(!record.noindex);
        assert!(!record.nofollow);
        assert_eq!(record.robots_meta, None);
        assert!(record.structured_data_types.is_empty());
        assert!(!record.rich_result_eligible);
    }

    #[test]
    fn test_meta_robots_directives() {
        let html = r#"<meta name="Robots" content="NOINDEX, follow">"#;
        let record = HtmlClassifier::default().classify(html);
        assert!(record.noindex);
        assert!(!record.nofollow);
        assert_eq!(record.robots_meta.as_deref(), Some("NOINDEX, follow"));

        let record = HtmlClassifier::default().classify(r#"<meta name="robots" content="none">"#);
        assert!(record.noindex && record.nofollow);
    }

    #[test]
    fn test_valued_meta_directive_keeps_page_indexable() {
        let html = r#"<meta name="robots" content="index, follow, max-image-preview:none">"#;
        let record = HtmlClassifier::default().classify(html);
        assert!(!record.noindex);
        assert!(!record.nofollow);
    }

    #[test]
    fn test_bot_specific_meta_only_when_tracked() {
        let html = r#"<meta name="gptbot" content="noindex, nofollow">"#;
        assert!(!HtmlClassifier::default().classify(html).noindex);

        let record = HtmlClassifier::new(["GPTBot"]).classify(html);
        assert!(record.noindex);
        assert!(record.nofollow);
    }

    #[test]
    fn test_json_ld_types_and_rich_results() {
        let html = r#"
            <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
            <script type="application/ld+json">[{"@type": "FAQPage"}]</script>
            <script type="application/ld+json">{ this is not json </script>
        "#;
        let record = HtmlClassifier::default().classify(html);
        assert_eq!(record.json_ld_blocks, 2);
        assert_eq!(record.structured_data_types, vec!["Organization", "FAQPage"]);
        assert!(record.rich_result_eligible);
    }

    #[test]
    fn test_microdata() {
        let html = r#"<div itemscope itemtype="https://schema.org/Product"><span itemprop="name">X</span></div>"#;
        let record = HtmlClassifier::default().classify(html);
        assert!(record.microdata);
        assert_eq!(record.structured_data_types, vec!["Product"]);
        assert!(record.rich_result_eligible);
    }
}

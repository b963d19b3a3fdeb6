// src/classify/mod.rs
// =============================================================================
// Page content classification and platform detection.
//
// The auditor only talks to the two traits below; the implementations here
// are the defaults it ships with.
//
// Submodules:
// - content: HTML classifier (meta robots, JSON-LD, microdata)
// - directives: noindex/nofollow tokens of meta robots and X-Robots-Tag
// - structured: recursive @type collection over JSON-LD values
// - platform: header-signature based bot-protection detection
// =============================================================================

mod content;
mod directives;
mod platform;
mod structured;

use serde::Serialize;
use std::collections::BTreeMap;

pub use content::HtmlClassifier;
pub use directives::RobotsDirectives;
pub use platform::SignatureDetector;

/// Indexability signals found in one page body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageClassification {
    pub noindex: bool,
    pub nofollow: bool,
    /// Raw content of the matching meta robots tags, joined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots_meta: Option<String>,
    /// Number of JSON-LD blocks that parsed
    pub json_ld_blocks: usize,
    pub microdata: bool,
    /// schema.org types from JSON-LD and microdata, first-seen order
    pub structured_data_types: Vec<String>,
    pub rich_result_eligible: bool,
}

/// Whether a bot-protection platform appears to sit in front of the site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformDetection {
    pub detected: bool,
    pub indicators: Vec<String>,
}

impl PlatformDetection {
    /// Combines two detections, keeping indicator order and dropping repeats
    pub fn merge(mut self, other: PlatformDetection) -> Self {
        for indicator in other.indicators {
            if !self.indicators.contains(&indicator) {
                self.indicators.push(indicator);
            }
        }
        self.detected = self.detected || other.detected;
        self
    }
}

/// Turns a page body into a classification record
pub trait ContentClassifier: Send + Sync {
    fn classify(&self, html: &str) -> PageClassification;
}

/// Maps response headers (lower-cased names) to a detection
pub trait PlatformDetector: Send + Sync {
    fn detect(&self, headers: &BTreeMap<String, String>) -> PlatformDetection;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_detections() {
        let a = PlatformDetection { detected: true, indicators: vec!["sucuri".into()] };
        let b = PlatformDetection { detected: true, indicators: vec!["sucuri".into(), "imperva".into()] };
        let merged = a.merge(b).merge(PlatformDetection::default());
        assert!(merged.detected);
        assert_eq!(merged.indicators, vec!["sucuri", "imperva"]);
    }
}

// src/classify/platform.rs
// =============================================================================
// Detects bot-protection / CDN platforms from response headers.
//
// Each signature is a header name, optionally with a substring its value
// must contain. The first time a signature matches, its label is added to
// the indicator list.
// =============================================================================

use std::collections::BTreeMap;

use super::{PlatformDetection, PlatformDetector};

struct Signature {
    header: &'static str,
    // Lower-case substring the header value must contain, if any
    value_contains: Option<&'static str>,
    indicator: &'static str,
}

const SIGNATURES: &[Signature] = &[
    Signature { header: "cf-ray", value_contains: None, indicator: "cloudflare (cf-ray)" },
    Signature { header: "cf-mitigated", value_contains: None, indicator: "cloudflare (cf-mitigated)" },
    Signature { header: "server", value_contains: Some("cloudflare"), indicator: "cloudflare (server)" },
    Signature { header: "x-protection", value_contains: None, indicator: "x-protection" },
    Signature { header: "x-sucuri-id", value_contains: None, indicator: "sucuri" },
    Signature { header: "x-datadome", value_contains: None, indicator: "datadome" },
    Signature { header: "server", value_contains: Some("akamaighost"), indicator: "akamai (server)" },
    Signature { header: "x-akamai-transformed", value_contains: None, indicator: "akamai (x-akamai-transformed)" },
    Signature { header: "x-iinfo", value_contains: None, indicator: "imperva" },
];

/// The default detector: a fixed table of header signatures
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureDetector;

impl PlatformDetector for SignatureDetector {
    fn detect(&self, headers: &BTreeMap<String, String>) -> PlatformDetection {
        let mut indicators: Vec<String> = Vec::new();

        for signature in SIGNATURES {
            let Some(value) = headers.get(signature.header) else {
                continue;
            };
            let hit = match signature.value_contains {
                Some(needle) => value.to_lowercase().contains(needle),
                None => true,
            };
            if hit && !indicators.iter().any(|i| i == signature.indicator) {
                indicators.push(signature.indicator.to_string());
            }
        }

        PlatformDetection {
            detected: !indicators.is_empty(),
            indicators,
        }
    }
}

// src/classify/directives.rs
// =============================================================================
// Tokenizes robots directive lists, as found in <meta name="robots"> content
// and in the X-Robots-Tag response header.
//
// Examples:
// - "noindex, nofollow"
// - "googlebot: noindex"           (header form with a bot prefix)
// - "max-image-preview:none"       (a valued directive, NOT "none")
//
// Tokens are compared exactly, never by substring.
// =============================================================================

/// Directives that take a value after ':'; the key is not a bot name
const VALUED_DIRECTIVES: &[&str] = &[
    "max-snippet",
    "max-image-preview",
    "max-video-preview",
    "unavailable_after",
];

/// The indexing flags a directive list sets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RobotsDirectives {
    pub noindex: bool,
    pub nofollow: bool,
}

impl RobotsDirectives {
    pub fn parse(value: &str) -> Self {
        let mut flags = RobotsDirectives::default();
        for raw in value.split(',') {
            let token = raw.trim().to_lowercase();
            let token = match token.split_once(':') {
                Some((key, _)) if VALUED_DIRECTIVES.contains(&key.trim()) => continue,
                // "<bot>: directive"
                Some((_, rest)) => rest.trim().to_string(),
                None => token,
            };

            match token.as_str() {
                "noindex" => flags.noindex = true,
                "nofollow" => flags.nofollow = true,
                "none" => {
                    flags.noindex = true;
                    flags.nofollow = true;
                }
                _ => {}
            }
        }
        flags
    }

    /// Combines flags from several sources; any source can set a flag
    pub fn merge(self, other: RobotsDirectives) -> Self {
        RobotsDirectives {
            noindex: self.noindex || other.noindex,
            nofollow: self.nofollow || other.nofollow,
        }
    }
}

// src/robots/pattern.rs
// =============================================================================
// Compiles robots.txt path patterns into regular expressions.
//
// Pattern rules:
// - Every pattern is anchored at the start of the path
// - `*` matches any sequence of characters (including none)
// - A trailing `$` anchors the end of the path
// - Everything else is matched literally (regex metacharacters are escaped)
// - An empty pattern only matches the empty path, so `Disallow:` is a no-op
// =============================================================================

use regex::Regex;
use tracing::debug;

/// A compiled robots.txt path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    // None only if the regex engine refused the pattern (size limits).
    // Such a pattern never matches.
    matcher: Option<Regex>,
}

impl PathPattern {
    pub fn compile(pattern: &str) -> Self {
        let matcher = match Regex::new(&to_regex(pattern)) {
            Ok(re) => Some(re),
            Err(e) => {
                debug!("skipping uncompilable robots pattern {:?}: {}", pattern, e);
                None
            }
        };

        PathPattern {
            source: pattern.to_string(),
            matcher,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Precedence weight: the character length of the raw pattern,
    /// wildcards included.
    pub fn specificity(&self) -> usize {
        self.source.chars().count()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.as_ref().is_some_and(|re| re.is_match(path))
    }
}

// Translates a robots pattern into regex source text
//
// Examples:
//   "/private"   -> "^/private"
//   "/*.pdf$"    -> "^/.*\.pdf$"
//   ""           -> "^$"
fn to_regex(pattern: &str) -> String {
    let (body, end_anchored) = match pattern.strip_suffix('$') {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    let literal_parts: Vec<String> = body.split('*').map(regex::escape).collect();

    let mut source = String::from("(?s)^");
    source.push_str(&literal_parts.join(".*"));
    if end_anchored || pattern.is_empty() {
        source.push('$');
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_match() {
        let p = PathPattern::compile("/private");
        assert!(p.matches("/private"));
        assert!(p.matches("/private/page"));
        assert!(p.matches("/privateer"));
        assert!(!p.matches("/public"));
        assert!(!p.matches("/x/private"));
    }

    #[test]
    fn test_wildcard_with_end_anchor() {
        let p = PathPattern::compile("/*.pdf$");
        assert!(p.matches("/file.pdf"));
        assert!(p.matches("/docs/a/b.pdf"));
        assert!(!p.matches("/file.pdf.json"));
        assert!(!p.matches("/file.pdfx"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let p = PathPattern::compile("/search?q=(a+b)");
        assert!(p.matches("/search?q=(a+b)&page=2"));
        assert!(!p.matches("/searchXq=(a+b)"));

        // A `$` that is not trailing is just a character
        let p = PathPattern::compile("/price$/list");
        assert!(p.matches("/price$/list/1"));
    }

    #[test]
    fn test_empty_pattern_matches_only_empty_path() {
        let p = PathPattern::compile("");
        assert!(p.matches(""));
        assert!(!p.matches("/"));
        assert!(!p.matches("/anything"));
    }

    #[test]
    fn test_specificity_counts_wildcards() {
        assert_eq!(PathPattern::compile("/x").specificity(), 2);
        assert_eq!(PathPattern::compile("/*.pdf$").specificity(), 7);
        assert_eq!(PathPattern::compile("").specificity(), 0);
    }
}

// src/robots/policy.rs
// =============================================================================
// Parses robots.txt into a queryable policy and answers allow/deny questions.
//
// How a query is answered:
// 1. Pick the group whose agent token is the longest one contained in the
//    (lower-cased) crawler identity. `*` counts as an empty token, so it
//    matches everyone but loses to any named token. Equal lengths: first
//    group in the file wins.
// 2. No group matches -> allowed.
// 3. Inside the group, collect the rules whose pattern matches the path.
//    None match -> allowed.
// 4. The rule with the longest pattern wins. On a tie, Allow beats Disallow.
//
// Parsing never fails: lines without a `:` or with an unknown key are
// skipped. `Sitemap:` lines are collected for the whole document.
// =============================================================================

use serde::Serialize;
use std::fmt;

use super::pattern::PathPattern;

/// Whether a rule grants or denies access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Allow,
    Disallow,
}

/// One `Allow:` or `Disallow:` line
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub pattern: PathPattern,
}

impl Rule {
    pub fn new(kind: RuleKind, pattern: &str) -> Self {
        Rule {
            kind,
            pattern: PathPattern::compile(pattern),
        }
    }

    pub fn specificity(&self) -> usize {
        self.pattern.specificity()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    // Does this rule take precedence over `other`?
    fn outranks(&self, other: &Rule) -> bool {
        let (mine, theirs) = (self.specificity(), other.specificity());
        mine > theirs
            || (mine == theirs && self.kind == RuleKind::Allow && other.kind == RuleKind::Disallow)
    }
}

// Prints the rule the way it appears in robots.txt, e.g. "Disallow: /private"
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.kind {
            RuleKind::Allow => "Allow",
            RuleKind::Disallow => "Disallow",
        };
        write!(f, "{}: {}", key, self.pattern.as_str())
    }
}

/// A `User-agent:` block: one or more agent tokens and their rules
#[derive(Debug, Clone, Default)]
pub struct DirectiveGroup {
    /// Lower-cased agent tokens. The wildcard `*` is stored as "".
    pub agents: Vec<String>,
    pub rules: Vec<Rule>,
}

impl DirectiveGroup {
    fn add_agent(&mut self, value: &str) {
        let token = if value == "*" {
            String::new()
        } else {
            value.to_lowercase()
        };
        if !self.agents.contains(&token) {
            self.agents.push(token);
        }
    }

    /// Agent tokens as written in the file (the wildcard shown as `*`)
    pub fn agent_labels(&self) -> Vec<String> {
        self.agents
            .iter()
            .map(|a| if a.is_empty() { "*".to_string() } else { a.clone() })
            .collect()
    }

    // Length of the longest token of this group that matches the identity
    fn match_length(&self, identity: &str) -> Option<usize> {
        self.agents
            .iter()
            .filter(|token| token.is_empty() || identity.contains(token.as_str()))
            .map(|token| token.len())
            .max()
    }
}

/// The outcome of a policy query
#[derive(Debug, Clone, Copy)]
pub struct Verdict<'a> {
    pub allowed: bool,
    /// The rule that decided the outcome, if any rule matched
    pub rule: Option<&'a Rule>,
}

/// A parsed robots.txt document. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    groups: Vec<DirectiveGroup>,
    sitemaps: Vec<String>,
}

impl Policy {
    /// Parses raw robots.txt text. Total: never fails, bad lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut groups = Vec::new();
        let mut sitemaps = Vec::new();
        let mut current = DirectiveGroup::default();

        for raw_line in text.lines() {
            // Strip inline comments, surrounding whitespace and a leading BOM
            let line = raw_line.split('#').next().unwrap_or("");
            let line = line.trim_start_matches('\u{feff}').trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // Consecutive User-agent lines share one group; a
                    // User-agent after rules starts the next group
                    if !current.rules.is_empty() {
                        push_group(&mut groups, std::mem::take(&mut current));
                    }
                    // A blank value names nobody; only `*` is the wildcard
                    if !value.is_empty() {
                        current.add_agent(value);
                    }
                }
                "allow" => current.rules.push(Rule::new(RuleKind::Allow, value)),
                "disallow" => current.rules.push(Rule::new(RuleKind::Disallow, value)),
                "sitemap" => {
                    if !value.is_empty() {
                        sitemaps.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        push_group(&mut groups, current);

        Policy { groups, sitemaps }
    }

    pub fn groups(&self) -> &[DirectiveGroup] {
        &self.groups
    }

    /// Sitemap URLs listed anywhere in the document, in file order
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Selects the group that applies to a crawler identity
    pub fn group_for(&self, identity: &str) -> Option<&DirectiveGroup> {
        let identity = identity.to_lowercase();
        let mut best: Option<(usize, &DirectiveGroup)> = None;

        for group in &self.groups {
            if let Some(len) = group.match_length(&identity) {
                // Strictly longer only, so the first-seen group keeps ties
                if best.map_or(true, |(best_len, _)| len > best_len) {
                    best = Some((len, group));
                }
            }
        }

        best.map(|(_, group)| group)
    }

    /// Decides access for `identity` on `path`, reporting the deciding rule
    pub fn evaluate(&self, identity: &str, path: &str) -> Verdict<'_> {
        let Some(group) = self.group_for(identity) else {
            return Verdict { allowed: true, rule: None };
        };

        let mut winner: Option<&Rule> = None;
        for rule in group.rules.iter().filter(|r| r.matches(path)) {
            if winner.map_or(true, |w| rule.outranks(w)) {
                winner = Some(rule);
            }
        }

        Verdict {
            allowed: winner.map_or(true, |r| r.kind == RuleKind::Allow),
            rule: winner,
        }
    }

    pub fn is_allowed(&self, identity: &str, path: &str) -> bool {
        self.evaluate(identity, path).allowed
    }

    /// The non-empty Disallow patterns of the group that applies to `identity`
    pub fn disallowed_patterns(&self, identity: &str) -> Vec<String> {
        self.group_for(identity)
            .map(|group| {
                group
                    .rules
                    .iter()
                    .filter(|r| r.kind == RuleKind::Disallow && !r.pattern.as_str().is_empty())
                    .map(|r| r.pattern.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

// Rules that no User-agent line claimed apply to nobody
fn push_group(groups: &mut Vec<DirectiveGroup>, group: DirectiveGroup) {
    if !group.agents.is_empty() {
        groups.push(group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_allows_everything() {
        let policy = Policy::parse("");
        assert!(policy.is_allowed("GPTBot", "/"));
        assert!(policy.is_allowed("anything", "/private/deep/path"));
        assert!(policy.disallowed_patterns("GPTBot").is_empty());
    }

    #[test]
    fn test_single_named_group() {
        let policy = Policy::parse("User-agent: GPTBot\nDisallow: /private\n");
        assert!(!policy.is_allowed("GPTBot", "/private/page"));
        assert!(policy.is_allowed("GPTBot", "/public"));
        // No wildcard group, so other bots fall through to the default
        assert!(policy.is_allowed("OtherBot", "/private"));
    }

    #[test]
    fn test_longest_agent_token_wins() {
        let txt = "User-agent: a\nDisallow: /\n\nUser-agent: abot\nAllow: /\n";
        let policy = Policy::parse(txt);
        let group = policy.group_for("abot-crawler").unwrap();
        assert_eq!(group.agents, vec!["abot".to_string()]);
        assert!(policy.is_allowed("abot-crawler", "/page"));
    }

    #[test]
    fn test_named_group_beats_wildcard() {
        let txt = "User-agent: *\nDisallow: /\n\nUser-agent: Googlebot\nDisallow: /tmp\n";
        let policy = Policy::parse(txt);
        let ua = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
        assert!(policy.is_allowed(ua, "/blog"));
        assert!(!policy.is_allowed(ua, "/tmp/x"));
        assert!(!policy.is_allowed("SomeOtherBot", "/blog"));
    }

    #[test]
    fn test_equal_length_tokens_keep_first_group() {
        let txt = "User-agent: abc\nDisallow: /one\n\nUser-agent: bcd\nDisallow: /two\n";
        let policy = Policy::parse(txt);
        assert_eq!(policy.disallowed_patterns("abcd"), vec!["/one".to_string()]);
    }

    #[test]
    fn test_tie_goes_to_allow() {
        let policy = Policy::parse("User-agent: *\nDisallow: /x\nAllow: /x\n");
        let verdict = policy.evaluate("bot", "/x");
        assert!(verdict.allowed);
        assert_eq!(verdict.rule.unwrap().kind, RuleKind::Allow);
    }

    #[test]
    fn test_more_specific_rule_wins() {
        let txt = "User-agent: *\nDisallow: /api/\nAllow: /api/public/\n";
        let policy = Policy::parse(txt);
        assert!(!policy.is_allowed("bot", "/api/secret"));
        assert!(policy.is_allowed("bot", "/api/public/docs"));
    }

    #[test]
    fn test_wildcard_and_end_anchor() {
        let policy = Policy::parse("User-agent: *\nDisallow: /*.pdf$\n");
        assert!(!policy.is_allowed("bot", "/file.pdf"));
        assert!(policy.is_allowed("bot", "/file.pdf.json"));
    }

    #[test]
    fn test_empty_disallow_is_a_no_op() {
        let policy = Policy::parse("User-agent: *\nDisallow:\n");
        assert!(policy.is_allowed("bot", "/"));
        assert!(policy.disallowed_patterns("bot").is_empty());
    }

    #[test]
    fn test_consecutive_user_agents_share_a_group() {
        let txt = "User-agent: GPTBot\nUser-agent: ClaudeBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n";
        let policy = Policy::parse(txt);
        assert_eq!(policy.groups().len(), 2);
        assert!(!policy.is_allowed("GPTBot", "/"));
        assert!(!policy.is_allowed("ClaudeBot", "/"));
        assert!(policy.is_allowed("Bingbot", "/"));
    }

    #[test]
    fn test_sitemaps_are_global_and_malformed_lines_skipped() {
        let txt = "\
# comment line
Sitemap: https://example.com/a.xml
User-agent: *
this line has no separator
Crawl-delay: 10
Unknown-key: whatever
Disallow: /admin # inline comment
Sitemap: https://example.com/b.xml
";
        let policy = Policy::parse(txt);
        assert_eq!(
            policy.sitemaps(),
            &["https://example.com/a.xml".to_string(), "https://example.com/b.xml".to_string()]
        );
        assert_eq!(policy.disallowed_patterns("bot"), vec!["/admin".to_string()]);
    }

    #[test]
    fn test_deciding_rule_is_reported() {
        let policy = Policy::parse("User-agent: *\nDisallow: /\n");
        let verdict = policy.evaluate("bot", "/");
        assert!(!verdict.allowed);
        assert_eq!(verdict.rule.unwrap().to_string(), "Disallow: /");

        let empty = Policy::default();
        let verdict = empty.evaluate("bot", "/");
        assert!(verdict.allowed);
        assert!(verdict.rule.is_none());
    }

    #[test]
    fn test_blank_user_agent_is_not_a_wildcard() {
        let policy = Policy::parse("User-agent:\nDisallow: /\n");
        assert!(policy.is_allowed("GPTBot", "/"));
        assert!(policy.disallowed_patterns("GPTBot").is_empty());

        // The blank line does not leak into a neighbouring group either
        let policy = Policy::parse(
            "User-agent: GPTBot\nDisallow: /private\n\nUser-agent:\nDisallow: /\n",
        );
        assert!(policy.is_allowed("GPTBot", "/public"));
        assert!(!policy.is_allowed("GPTBot", "/private"));
        assert!(policy.is_allowed("Bingbot", "/"));
        assert_eq!(policy.groups().len(), 1);
    }
}

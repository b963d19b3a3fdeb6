// src/robots/mod.rs
// =============================================================================
// The robots exclusion policy engine.
//
// Submodules:
// - pattern: compiles `Allow`/`Disallow` path patterns into matchers
// - policy: parses robots.txt and answers allow/deny queries
//
// Everything here is pure and synchronous; fetching the document is the
// auditor's job.
// =============================================================================

mod pattern;
mod policy;

pub use policy::Policy;

/// Root-relative location of the policy document
pub const ROBOTS_PATH: &str = "/robots.txt";

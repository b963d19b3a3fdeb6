// src/sitemap/mod.rs
// =============================================================================
// Sitemap discovery and traversal.
//
// Submodules:
// - extract: decoding and <loc> extraction (pure, never fails)
// - crawler: probes candidate sitemaps and walks index trees
// =============================================================================

mod crawler;
mod extract;

pub use crawler::{CrawlSettings, SitemapCrawler, SitemapEntry};

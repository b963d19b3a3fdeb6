// src/sitemap/crawler.rs
// =============================================================================
// Finds a site's sitemaps and walks the sitemap tree into a bounded URL list.
//
// Discovery:
// - Candidates are the robots.txt `Sitemap:` hints followed by a few
//   conventional locations (/sitemap.xml, /sitemap_index.xml, ...)
// - A candidate is confirmed when it answers 2xx/3xx AND contains a <loc>
//
// Traversal (breadth-first, like a page crawler but over sitemap files):
// 1. Start with one entry sitemap in a queue
// 2. Fetch it and extract its <loc> entries
// 3. All entries look like sitemap files -> it is an index, queue them
//    Otherwise -> it is a leaf, collect its entries as page URLs
// 4. Stop when the document cap or URL cap is hit, or the queue runs dry
//
// A sitemap that fails to load just contributes nothing.
// =============================================================================

use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::extract::{decode_document, extract_locations, has_location_marker, is_sitemap_file};
use crate::probe::{Probe, ProbeRequest};

/// Conventional sitemap locations tried on every origin
pub const WELL_KNOWN_SITEMAPS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemap.xml.gz",
    "/wp-sitemap.xml",
];

/// A sitemap that was probed and found to list something
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    pub url: String,
    pub status: Option<u16>,
}

/// Everything one traversal produced
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    /// Page URLs, deduplicated, in discovery order
    pub urls: Vec<String>,
    /// Sitemap documents fetched, in visit order
    pub visited: Vec<String>,
}

/// Request settings for sitemap fetching
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub user_agent: String,
    /// Timeout for each discovery candidate
    pub discovery_timeout: Duration,
    /// Timeout for each document fetched during traversal
    pub fetch_timeout: Duration,
    /// Maximum number of sitemap documents a traversal may fetch
    pub max_documents: usize,
}

// Index: every location is another sitemap. Leaf: page URLs.
#[derive(Debug, PartialEq, Eq)]
enum NodeKind {
    Index,
    Leaf,
}

fn classify(locations: &[String]) -> NodeKind {
    if !locations.is_empty() && locations.iter().all(|loc| is_sitemap_file(loc)) {
        NodeKind::Index
    } else {
        NodeKind::Leaf
    }
}

pub struct SitemapCrawler {
    prober: Arc<dyn Probe>,
    settings: CrawlSettings,
}

impl SitemapCrawler {
    pub fn new(prober: Arc<dyn Probe>, settings: CrawlSettings) -> Self {
        SitemapCrawler { prober, settings }
    }

    /// Probes hinted and conventional sitemap locations.
    ///
    /// Returns the confirmed ones in candidate order (hints first).
    pub async fn discover(&self, origin: &Url, hints: &[String]) -> Vec<SitemapEntry> {
        let candidates = candidate_urls(origin, hints);
        debug!("probing {} sitemap candidate(s)", candidates.len());

        // join_all keeps the input order regardless of which probe finishes first
        let probes = candidates.into_iter().map(|url| {
            let request = ProbeRequest::get(
                url,
                self.settings.user_agent.clone(),
                self.settings.discovery_timeout,
            );
            self.prober.probe(request)
        });

        join_all(probes)
            .await
            .into_iter()
            .filter(|result| {
                result.success
                    && result
                        .body
                        .as_deref()
                        .is_some_and(|body| has_location_marker(&decode_document(body)))
            })
            .map(|result| SitemapEntry {
                url: result.url,
                status: result.status,
            })
            .collect()
    }

    /// Walks the sitemap tree under `entry` and returns at most `max_urls` page URLs
    pub async fn collect(&self, entry: &str, max_urls: usize) -> Vec<String> {
        self.traverse(entry, max_urls).await.urls
    }

    /// Like `collect`, but also reports which documents were fetched
    pub async fn traverse(&self, entry: &str, max_urls: usize) -> Traversal {
        let mut queue = VecDeque::from([entry.to_string()]);
        // Every sitemap URL that has ever been queued, so none is visited twice
        let mut enqueued = HashSet::from([entry.to_string()]);
        let mut collected = HashSet::new();
        let mut traversal = Traversal::default();

        while traversal.visited.len() < self.settings.max_documents
            && traversal.urls.len() < max_urls
        {
            let Some(node) = queue.pop_front() else {
                break;
            };

            let locations = self.fetch_locations(&node).await;
            traversal.visited.push(node);

            match classify(&locations) {
                NodeKind::Index => {
                    for location in locations {
                        if enqueued.insert(location.clone()) {
                            queue.push_back(location);
                        }
                    }
                }
                NodeKind::Leaf => {
                    for location in locations {
                        if traversal.urls.len() >= max_urls {
                            break;
                        }
                        if collected.insert(location.clone()) {
                            traversal.urls.push(location);
                        }
                    }
                }
            }
        }

        info!(
            "sitemap traversal from {} visited {} document(s), collected {} URL(s)",
            entry,
            traversal.visited.len(),
            traversal.urls.len()
        );
        traversal
    }

    // Fetches one sitemap document; a failed fetch counts as "no locations"
    async fn fetch_locations(&self, url: &str) -> Vec<String> {
        let request = ProbeRequest::get(url, self.settings.user_agent.clone(), self.settings.fetch_timeout);
        let result = self.prober.probe(request).await;

        if !result.success {
            debug!("sitemap {} unavailable (status {:?})", url, result.status);
            return Vec::new();
        }

        let document = result.body.as_deref().map(decode_document).unwrap_or_default();
        extract_locations(&document)
    }
}

// Hints (resolved against the origin) then conventional paths, deduplicated
fn candidate_urls(origin: &Url, hints: &[String]) -> Vec<String> {
    let hinted = hints.iter().map(String::as_str);
    let conventional = WELL_KNOWN_SITEMAPS.iter().copied();

    let mut seen = HashSet::new();
    hinted
        .chain(conventional)
        .filter_map(|location| origin.join(location).ok())
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why VecDeque + HashSet again?
//    - VecDeque gives breadth-first order (push_back / pop_front)
//    - HashSet remembers every sitemap URL ever queued, so cycles like
//      a.xml -> b.xml -> a.xml cannot loop forever
//
// 2. Why is a failed fetch not an error?
//    - One broken child sitemap should not throw away the others
//    - fetch_locations() returns an empty Vec and the loop moves on
// -----------------------------------------------------------------------------

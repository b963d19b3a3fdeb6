// src/probe/testing.rs
// In-memory `Probe` used by unit tests that should not touch the network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{Probe, ProbeFailure, ProbeRequest, ProbeResult};

/// Serves canned responses by exact URL and records every request.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeProber {
    routes: HashMap<String, ProbeResult>,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<ProbeRequest>>,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(url.to_string(), ProbeResult::response(url, status).with_body(body));
        self
    }

    pub fn result(mut self, url: &str, result: ProbeResult) -> Self {
        self.routes.insert(url.to_string(), result);
        self
    }

    /// Makes `url` take longer than any sensible timeout
    pub fn hang(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<ProbeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Probe for FakeProber {
    async fn probe(&self, request: ProbeRequest) -> ProbeResult {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delays.get(&request.url) {
            if *delay >= request.timeout {
                tokio::time::sleep(request.timeout).await;
                return ProbeResult::failed(request.url, ProbeFailure::Timeout);
            }
            tokio::time::sleep(*delay).await;
        }

        self.routes
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| ProbeResult::response(request.url, 404))
    }
}

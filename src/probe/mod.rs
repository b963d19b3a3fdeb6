// src/probe/mod.rs
// =============================================================================
// The HTTP probe capability: one bounded request, never an error.
//
// Every outbound request the auditor makes goes through the `Probe` trait.
// A probe always produces a `ProbeResult`; network failures, timeouts and
// bad statuses are all folded into `success = false` so callers never have
// to handle transport errors themselves.
//
// Submodules:
// - http: the real implementation on top of reqwest
// =============================================================================

mod http;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub use http::HttpProber;

/// Which HTTP method to use for a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    /// Headers only, used for access profiling
    Head,
    /// Full body, used for documents and sampled pages
    Get,
}

/// Everything needed to issue one probe
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub method: ProbeMethod,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        ProbeRequest {
            url: url.into(),
            user_agent: user_agent.into(),
            timeout,
            method: ProbeMethod::Get,
        }
    }

    pub fn head(url: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        ProbeRequest {
            method: ProbeMethod::Head,
            ..Self::get(url, user_agent, timeout)
        }
    }
}

/// Why a probe produced no response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// Request timed out
    Timeout,
    /// Redirect loop or too many hops
    TooManyRedirects,
    /// Could not resolve hostname
    DnsError,
    /// TCP connection refused or reset
    ConnectionFailed,
    /// SSL/TLS certificate error
    SslError,
    /// Anything else, with the underlying message
    Other(String),
}

/// The outcome of one probe
#[derive(Debug, Clone, Default)]
pub struct ProbeResult {
    pub url: String,
    /// HTTP status, `None` when no response arrived
    pub status: Option<u16>,
    /// 2xx or 3xx
    pub success: bool,
    /// Response headers with lower-cased names
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub failure: Option<ProbeFailure>,
}

impl ProbeResult {
    /// Builds a result for a response that did arrive
    pub fn response(url: impl Into<String>, status: u16) -> Self {
        ProbeResult {
            url: url.into(),
            status: Some(status),
            success: (200..400).contains(&status),
            ..Default::default()
        }
    }

    /// Builds a result for a request that never got a response
    pub fn failed(url: impl Into<String>, failure: ProbeFailure) -> Self {
        ProbeResult {
            url: url.into(),
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Looks up a header by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The body decoded as UTF-8 (lossy), or "" when there is none
    pub fn text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

/// Something that can perform a single bounded HTTP attempt
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, request: ProbeRequest) -> ProbeResult;
}

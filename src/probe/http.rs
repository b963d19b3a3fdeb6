// src/probe/http.rs
// =============================================================================
// Probes URLs over real HTTP with reqwest.
//
// Key functionality:
// - HEAD for header-only probes, GET when the body is needed
// - A per-request timeout (the client itself has none)
// - Sends the crawler identity's User-Agent on every request
// - Detects the various failure modes (timeout, DNS, SSL, redirects, ...)
//
// Only 2xx/3xx count as success. Any other status is passed through as-is;
// interpreting it is up to the caller.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use tracing::debug;

use super::{Probe, ProbeFailure, ProbeMethod, ProbeRequest, ProbeResult};

/// A `Probe` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpProber {
    // Client is an Arc internally, cloning it is cheap
    client: Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .build()?;
        Ok(HttpProber { client })
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, request: ProbeRequest) -> ProbeResult {
        let builder = match request.method {
            ProbeMethod::Head => self.client.head(&request.url),
            ProbeMethod::Get => self.client.get(&request.url),
        };

        let response = match builder
            .header(USER_AGENT, &request.user_agent)
            .timeout(request.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("probe of {} failed: {}", request.url, e);
                return ProbeResult::failed(request.url, categorize_error(&e));
            }
        };

        let mut result = ProbeResult::response(request.url, response.status().as_u16());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                result = result.with_header(name.as_str(), value);
            }
        }

        if request.method == ProbeMethod::Get {
            match response.bytes().await {
                Ok(bytes) => result = result.with_body(bytes.to_vec()),
                Err(e) => {
                    // The status line arrived but the body did not
                    debug!("reading body of {} failed: {}", result.url, e);
                    result.success = false;
                    result.failure = Some(categorize_error(&e));
                }
            }
        }

        result
    }
}

// Categorizes the different error types reqwest can produce
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
fn categorize_error(error: &reqwest::Error) -> ProbeFailure {
    let error_string = error.to_string().to_lowercase();

    if error.is_timeout() {
        ProbeFailure::Timeout
    } else if error.is_redirect() {
        ProbeFailure::TooManyRedirects
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            ProbeFailure::DnsError
        } else {
            ProbeFailure::ConnectionFailed
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        ProbeFailure::SslError
    } else {
        ProbeFailure::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_returns_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "TestBot/1.0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Robots-Tag", "noindex")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let prober = HttpProber::new().unwrap();
        let url = format!("{}/page", server.uri());
        let result = prober
            .probe(ProbeRequest::get(&url, "TestBot/1.0", Duration::from_secs(5)))
            .await;

        assert!(result.success);
        assert_eq!(result.status, Some(200));
        assert_eq!(result.header("x-robots-tag"), Some("noindex"));
        assert_eq!(result.text(), "<html></html>");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let prober = HttpProber::new().unwrap();
        let result = prober
            .probe(ProbeRequest::head(server.uri(), "TestBot/1.0", Duration::from_secs(5)))
            .await;

        assert!(result.success);
        assert!(result.body.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let prober = HttpProber::new().unwrap();
        let result = prober
            .probe(ProbeRequest::get(server.uri(), "TestBot/1.0", Duration::from_secs(5)))
            .await;

        assert!(!result.success);
        assert_eq!(result.status, Some(403));
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_a_failed_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let prober = HttpProber::new().unwrap();
        let result = prober
            .probe(ProbeRequest::get(server.uri(), "TestBot/1.0", Duration::from_millis(100)))
            .await;

        assert!(!result.success);
        assert_eq!(result.status, None);
        assert_eq!(result.failure, Some(ProbeFailure::Timeout));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_failed_probe() {
        let prober = HttpProber::new().unwrap();
        // Port 1 on localhost is closed
        let result = prober
            .probe(ProbeRequest::get("http://127.0.0.1:1/", "TestBot/1.0", Duration::from_secs(2)))
            .await;

        assert!(!result.success);
        assert_eq!(result.status, None);
        assert!(result.failure.is_some());
    }
}

//! HTTP(S) probing.
//!
//! One locator at a time: issue the configured verb, follow redirects by hand,
//! retry transient failures, and normalize the final response into a
//! [`ProbeRecord`].

mod redirects;

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::header::HeaderMap;

use crate::config::{Config, ProbeVerb, MAX_REDIRECT_HOPS, RETRYABLE_STATUS_CODES};
use crate::error_handling::{categorize_reqwest_error, OutcomeType, ProbeError};
use crate::locator::Locator;
use crate::record::{HttpParts, ProbeRecord};
use crate::retry::RetryPolicy;

pub use redirects::{resolve_redirect_chain, ResolvedResponse};

/// Probes a single HTTP(S) locator.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Always yields a record; failures are encoded in it.
    async fn probe(&self, locator: &Locator) -> ProbeRecord;
}

/// Final response of one attempt, detached from the connection.
#[derive(Debug)]
struct Attempt {
    status: u16,
    headers: HeaderMap,
    redirected_to: Option<String>,
    body: Option<Vec<u8>>,
}

#[derive(Debug)]
enum AttemptError {
    Transport(ProbeError),
    RetryableStatus(u16),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Transport(e) => e.fmt(f),
            AttemptError::RetryableStatus(status) => write!(f, "HTTP status {status}"),
        }
    }
}

/// HTTP prober sharing one client across all locators of a run.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Arc<reqwest::Client>,
    policy: RetryPolicy,
    verb: ProbeVerb,
    max_hops: usize,
}

impl HttpProber {
    /// # Arguments
    ///
    /// * `client` - Client with automatic redirects disabled
    /// * `policy` - Retry policy for transient failures
    /// * `verb` - `HEAD` (headers only) or `GET` (headers and body)
    pub fn new(client: Arc<reqwest::Client>, policy: RetryPolicy, verb: ProbeVerb) -> Self {
        Self {
            client,
            policy,
            verb,
            max_hops: MAX_REDIRECT_HOPS,
        }
    }

    pub fn from_config(client: Arc<reqwest::Client>, config: &Config) -> Self {
        Self::new(client, RetryPolicy::from_config(config), config.verb)
    }

    async fn attempt(&self, url: &str) -> Result<Attempt, AttemptError> {
        let resolved = resolve_redirect_chain(&self.client, self.verb.method(), url, self.max_hops)
            .await
            .map_err(AttemptError::Transport)?;

        let status = resolved.response.status().as_u16();
        if RETRYABLE_STATUS_CODES.contains(&status) {
            return Err(AttemptError::RetryableStatus(status));
        }

        let redirected_to = resolved.redirected_to();
        let headers = resolved.response.headers().clone();
        let body = if self.verb.is_identity() {
            None
        } else {
            let bytes = resolved
                .response
                .bytes()
                .await
                .map_err(|e| AttemptError::Transport(categorize_reqwest_error(&e)))?;
            Some(bytes.to_vec())
        };

        Ok(Attempt {
            status,
            headers,
            redirected_to,
            body,
        })
    }
}

#[async_trait]
impl HttpProbe for HttpProber {
    async fn probe(&self, locator: &Locator) -> ProbeRecord {
        let raw = locator.raw();
        // Every transport failure is worth another try over HTTP
        let outcome = self
            .policy
            .execute(raw, || self.attempt(raw), |_: &AttemptError| true)
            .await;

        match outcome.result {
            Ok(attempt) => {
                debug!("{} answered {} after {} attempt(s)", raw, attempt.status, outcome.attempts);
                ProbeRecord::from_http(
                    raw,
                    HttpParts {
                        status: attempt.status,
                        headers: &attempt.headers,
                        redirected_to: attempt.redirected_to,
                        body: attempt.body,
                    },
                )
            }
            Err(AttemptError::RetryableStatus(status)) => ProbeRecord::status_only(raw, status),
            Err(AttemptError::Transport(_)) => {
                ProbeRecord::failed(raw, OutcomeType::RetriesExhausted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_HOST_LENGTH;
    use crate::locator::classify;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use std::time::Duration;

    fn prober(verb: ProbeVerb) -> HttpProber {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client");
        HttpProber::new(
            Arc::new(client),
            RetryPolicy::new(4, Duration::from_millis(1)),
            verb,
        )
    }

    fn locator(url: &str) -> Locator {
        classify(url, MAX_HOST_LENGTH).expect("valid locator")
    }

    #[tokio::test]
    async fn test_head_reachable_has_no_content() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/dados.csv")).respond_with(
                status_code(200)
                    .append_header("Content-Type", "text/csv; charset=utf-8")
                    .append_header("ETag", "\"v1\""),
            ),
        );

        let url = server.url("/dados.csv").to_string();
        let record = prober(ProbeVerb::Head).probe(&locator(&url)).await;

        assert_eq!(record.status(), Some(200));
        assert_eq!(record.url(), url);
        assert_eq!(record.mime_type(), Some("text/csv"));
        assert_eq!(record.encoding(), Some("utf-8"));
        assert_eq!(record.etag(), Some("\"v1\""));
        assert_eq!(record.content(), None);
        assert_eq!(record.outcome(), OutcomeType::Reachable);
    }

    #[tokio::test]
    async fn test_get_attaches_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/data.json"))
                .respond_with(status_code(200).body("{\"ok\":true}")),
        );

        let url = server.url("/data.json").to_string();
        let record = prober(ProbeVerb::Get).probe(&locator(&url)).await;

        assert_eq!(record.content(), Some(&b"{\"ok\":true}"[..]));
    }

    #[tokio::test]
    async fn test_always_503_exhausts_retries() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/busy"))
                .times(4)
                .respond_with(status_code(503)),
        );

        let url = server.url("/busy").to_string();
        let record = prober(ProbeVerb::Head).probe(&locator(&url)).await;

        assert_eq!(record.status(), Some(503));
        assert_eq!(record.content(), None);
        assert_eq!(record.outcome(), OutcomeType::RetriesExhausted);
    }

    #[tokio::test]
    async fn test_redirect_keeps_requested_url() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/x"))
                .respond_with(status_code(301).append_header("Location", "/y")),
        );
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/y")).respond_with(
                status_code(200)
                    .append_header("Content-Type", "application/pdf")
                    .append_header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
            ),
        );

        let url = server.url("/x").to_string();
        let record = prober(ProbeVerb::Head).probe(&locator(&url)).await;

        assert_eq!(record.url(), url);
        assert_eq!(record.url_redirect(), Some(server.url("/y").to_string().as_str()));
        assert_eq!(record.mime_type(), Some("application/pdf"));
        assert_eq!(record.last_modified(), Some("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(record.outcome(), OutcomeType::Redirected);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/gone"))
                .times(1)
                .respond_with(status_code(404)),
        );

        let url = server.url("/gone").to_string();
        let record = prober(ProbeVerb::Head).probe(&locator(&url)).await;
        assert_eq!(record.status(), Some(404));
        assert_eq!(record.outcome(), OutcomeType::HttpErrorStatus);
    }

    #[tokio::test]
    async fn test_connection_refused_yields_total_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let url = format!("http://{addr}/file.csv");
        let record = prober(ProbeVerb::Head).probe(&locator(&url)).await;

        assert_eq!(record.url(), url);
        assert!(record.is_total_failure());
        assert_eq!(record.outcome(), OutcomeType::RetriesExhausted);
    }
}

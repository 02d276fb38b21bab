//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the HTTP client shared by all HTTP probes of a run.
///
/// Automatic redirects are disabled: the prober follows them itself to record
/// the chain. The connect timeout never exceeds the request timeout.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let timeout = config.request_timeout();
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS).min(timeout))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    #[tokio::test]
    async fn test_client_does_not_follow_redirects() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/moved"))
                .respond_with(status_code(302).append_header("Location", "/elsewhere")),
        );

        let client = init_client(&Config::default()).expect("client");
        let response = client
            .get(server.url("/moved").to_string())
            .send()
            .await
            .expect("response");
        assert_eq!(response.status(), 302);
    }
}

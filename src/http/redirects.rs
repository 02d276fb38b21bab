//! HTTP redirect chain resolution.
//!
//! Redirects are followed by hand with a client that has automatic redirects
//! disabled, so the full path from the requested locator to the final
//! resource is known.

use log::warn;
use reqwest::header::LOCATION;
use reqwest::{Method, Response, StatusCode, Url};

use crate::error_handling::{categorize_reqwest_error, ProbeError};

/// Final response of a redirect chain.
#[derive(Debug)]
pub struct ResolvedResponse {
    /// Every URL requested, starting with the locator itself
    pub chain: Vec<String>,
    /// Response to the last URL of the chain
    pub response: Response,
}

impl ResolvedResponse {
    pub fn final_url(&self) -> &str {
        self.chain.last().map(String::as_str).unwrap_or_default()
    }

    /// Final URL when it differs from the requested one.
    pub fn redirected_to(&self) -> Option<String> {
        match (self.chain.first(), self.chain.last()) {
            (Some(first), Some(last)) if self.chain.len() > 1 && first != last => {
                Some(last.clone())
            }
            _ => None,
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Requests `start_url` with `method`, following redirects up to `max_hops` times.
///
/// # Arguments
///
/// * `client` - HTTP client with redirects disabled
/// * `method` - Verb used for every hop
/// * `start_url` - The locator to request
/// * `max_hops` - Maximum number of redirects to follow
///
/// # Errors
///
/// Returns a transport error categorized as [`ProbeError`], or a protocol error
/// when a `Location` header is unusable or the chain is longer than `max_hops`.
pub async fn resolve_redirect_chain(
    client: &reqwest::Client,
    method: Method,
    start_url: &str,
    max_hops: usize,
) -> Result<ResolvedResponse, ProbeError> {
    let mut chain: Vec<String> = Vec::new();
    let mut current = start_url.to_string();

    for hop in 0..=max_hops {
        chain.push(current.clone());
        let response = client
            .request(method.clone(), &current)
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;

        let status = response.status();
        if !is_redirect(status) {
            return Ok(ResolvedResponse { chain, response });
        }

        let Some(location) = response.headers().get(LOCATION) else {
            warn!(
                "Redirect status {} for {} but no Location header",
                status.as_u16(),
                current
            );
            return Ok(ResolvedResponse { chain, response });
        };

        if hop == max_hops {
            break;
        }

        let location = location
            .to_str()
            .map_err(|_| ProbeError::protocol(format!("non-ASCII Location header from {current}")))?;
        let next = Url::parse(location)
            .or_else(|_| Url::parse(&current).and_then(|base| base.join(location)))
            .map_err(|e| ProbeError::protocol(format!("bad Location {location:?} from {current}: {e}")))?;
        current = next.to_string();
    }

    Err(ProbeError::protocol(format!(
        "more than {max_hops} redirects starting at {start_url}"
    )))
}

//! HTTP fetch layer with retry, status mapping, and truncation detection.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER};
use reqwest::{Client, StatusCode, Url};

use crate::error::ImportError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Bodies shorter than this are treated as proxy error stubs rather than
/// real product pages.
const MIN_HTML_LEN: usize = 1000;

/// HTTP client wrapper shared by all site adapters.
///
/// Every fetch runs under the configured retry policy; transient failures
/// (timeouts, 5xx, rate limits, truncated bodies) are retried with
/// exponential backoff while permanent failures surface immediately.
pub struct ImportClient {
    client: Client,
    policy: RetryPolicy,
}

impl ImportClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        policy: RetryPolicy,
    ) -> Result<Self, ImportError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, policy })
    }

    /// Underlying client, for callers that need raw requests such as proxy
    /// liveness probes.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Fetches a product page and returns its HTML.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::RateLimited`] on 429,
    /// [`ImportError::UnexpectedStatus`] on other non-2xx responses, and
    /// [`ImportError::TruncatedBody`] when the body is too short to be a
    /// real page. All of those are retried before surfacing.
    pub async fn fetch_html(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<String, ImportError> {
        retry_with_backoff(self.policy, || async {
            let response = self
                .client
                .get(url)
                .headers(browser_headers(referer))
                .send()
                .await?;
            let response = check_status(response, url)?;
            let body = response.text().await?;
            if body.len() < MIN_HTML_LEN {
                return Err(ImportError::TruncatedBody {
                    url: url.to_owned(),
                    len: body.len(),
                });
            }
            Ok(body)
        })
        .await
    }

    /// Fetches a JSON endpoint and deserializes the body.
    ///
    /// # Errors
    ///
    /// Same status mapping as [`fetch_html`](Self::fetch_html), plus
    /// [`ImportError::Deserialize`] when the body is not valid JSON.
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, ImportError> {
        retry_with_backoff(self.policy, || async {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await?;
            let response = check_status(response, url)?;
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|source| ImportError::Deserialize {
                context: format!("response body from {url}"),
                source,
            })
        })
        .await
    }
}

/// Header set matching what marketplaces serve full pages to.
fn browser_headers(referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if let Some(referer) = referer {
        if let Ok(value) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, value);
        }
    }
    headers
}

fn check_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, ImportError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        return Err(ImportError::RateLimited {
            domain: domain_of(url),
            retry_after_secs,
        });
    }
    if !status.is_success() {
        return Err(ImportError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(response)
}

fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_of_extracts_the_host() {
        assert_eq!(domain_of("https://www.amazon.com/dp/B01"), "www.amazon.com");
    }

    #[test]
    fn domain_of_falls_back_to_the_raw_url() {
        assert_eq!(domain_of("not a url"), "not a url");
    }

    #[test]
    fn browser_headers_include_a_referer_when_given() {
        let headers = browser_headers(Some("https://www.amazon.com/"));
        assert_eq!(
            headers.get(REFERER).and_then(|v| v.to_str().ok()),
            Some("https://www.amazon.com/")
        );
        assert!(headers.get(ACCEPT).is_some());
    }
}

//! HTTP markup fetching shared by every scraper.
//!
//! All sources go through [`PageClient::get_text`]: a GET with a desktop
//! user-agent, a per-request timeout, and a typed failure for both
//! transport errors and non-success statuses. Callers decide what a
//! failure means; inside the aggregator it always degrades to an empty
//! contribution.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Desktop browser user-agent sent by default.
pub const DESKTOP_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Thin wrapper around a shared [`reqwest::Client`].
///
/// Cloning is cheap; every scraper holds its own copy.
#[derive(Debug, Clone)]
pub struct PageClient {
    http: reqwest::Client,
}

impl PageClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(DESKTOP_AGENT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch a page as text with the default desktop user-agent.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        self.request(url, timeout, None).await
    }

    /// Fetch a page as text overriding the user-agent header.
    ///
    /// The community feed identifies itself with a bot agent instead of
    /// the desktop one.
    pub async fn get_text_as(
        &self,
        url: &str,
        timeout: Duration,
        agent: &str,
    ) -> Result<String, FetchError> {
        self.request(url, timeout, Some(agent)).await
    }

    async fn request(
        &self,
        url: &str,
        timeout: Duration,
        agent: Option<&str>,
    ) -> Result<String, FetchError> {
        let mut builder = self
            .http
            .get(url)
            .timeout(timeout)
            .header("Accept-Language", "en-US,en;q=0.9");
        if let Some(agent) = agent {
            builder = builder.header(reqwest::header::USER_AGENT, agent);
        }

        let response = builder.send().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        debug!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("example.com"));
    }
}

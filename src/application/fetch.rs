//! Retrieval of raw markdown from a caller-supplied URL.

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch markdown: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to fetch markdown: upstream returned {status}")]
    Status { status: reqwest::StatusCode },
}

/// Transport seam for deck retrieval. No retries and no internal timeout;
/// callers rely on the surrounding transport's own limits.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.inspect_err(|_| {
            counter!("sfoglia_fetch_error_total").increment(1);
        })?;

        let status = response.status();
        if !status.is_success() {
            counter!("sfoglia_fetch_error_total").increment(1);
            return Err(FetchError::Status { status });
        }

        Ok(response.text().await?)
    }
}

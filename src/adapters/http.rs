use crate::domain::ports::{FetchedPage, PageSource};
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Plain HTTP GET against the overview page.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        tracing::debug!("Fetching overview page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unreachable(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| unreachable(url, e))?;

        Ok(FetchedPage { status, body })
    }
}

fn unreachable(url: &str, error: reqwest::Error) -> BookingError {
    BookingError::UnreachablePage {
        url: url.to_string(),
        status: error.status().map(|s| s.as_u16()),
        reason: error.to_string(),
    }
}

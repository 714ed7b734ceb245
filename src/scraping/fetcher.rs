use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use tracing::{info, warn};

use super::PageSource;
use crate::error::FetchError;

/// Hard ceiling on attempts per URL, whatever the configuration says
pub const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 500;

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Honor HTTP_PROXY/HTTPS_PROXY/NO_PROXY from the environment
    pub proxy_from_env: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: Duration::from_secs(20),
            max_attempts: 1,
            proxy_from_env: true,
        }
    }
}

pub fn default_user_agent() -> String {
    format!(
        "congress-control/{} (+scheduled update)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Fetches pages over HTTP with an identifying user agent and caching disabled
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
}

impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let mut builder = Client::builder()
            .user_agent(options.user_agent.as_str())
            .default_headers(headers)
            .timeout(options.timeout);
        if !options.proxy_from_env {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            max_attempts: options.max_attempts.clamp(1, MAX_ATTEMPTS),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(transport)?;
        info!(url, status = status.as_u16(), bytes = body.len(), "fetched page");
        Ok(body)
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.max_attempts && err.is_retryable() => {
                    let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt - 1));
                    warn!(
                        "{} (attempt {}/{}), retrying in {:.1}s",
                        err,
                        attempt,
                        self.max_attempts,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

use crate::error::{CrawlError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

/// Downloads binary image content.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: ClientWithMiddleware,
}

impl HttpFetcher {
    /// Transient failures are retried up to `max_retries` times with
    /// increasing intervals. `referer` is sent with every request since
    /// image hosts tend to refuse hotlinks.
    pub fn new(max_retries: u32, referer: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(referer) = referer {
            let value = HeaderValue::from_str(referer).map_err(|e| CrawlError::fetch(referer, e))?;
            headers.insert(REFERER, value);
        }

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CrawlError::fetch("<client>", e))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CrawlError::fetch(url, e))?
            .error_for_status()
            .map_err(|e| CrawlError::fetch(url, e))?;
        let bytes = res.bytes().await.map_err(|e| CrawlError::fetch(url, e))?;
        Ok(bytes.to_vec())
    }
}

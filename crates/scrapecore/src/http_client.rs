//! HTTP client used by the health prober and by fetch operations wrapped in
//! the resilient executor. Wraps `reqwest` with retry middleware and a
//! token-bucket rate limiter; proxy routing goes through `ProxyDescriptor`.

use anyhow::{anyhow, Result};
use governor::{clock::DefaultClock, state::{InMemoryState, NotKeyed}, Quota, RateLimiter};
use reqwest::{Client, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::proxy::ProxyDescriptor;

pub struct HttpClient {
    client: Client,
    enhanced: ClientWithMiddleware,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    pub fn with_proxy(descriptor: &ProxyDescriptor) -> Result<Self> {
        Self::build(Some(descriptor))
    }

    fn build(descriptor: Option<&ProxyDescriptor>) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(30));
        if let Some(descriptor) = descriptor {
            builder = builder.proxy(Proxy::all(descriptor.to_url())?);
        }
        let client = builder.build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(3);
        let enhanced = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let rate_limiter = Arc::new(RateLimiter::direct(
            Quota::per_second(NonZeroU32::new(10).expect("10 is non-zero")).allow_burst(NonZeroU32::new(20).expect("20 is non-zero")),
        ));

        Ok(Self { client, enhanced, rate_limiter })
    }

    /// Unthrottled, non-retrying GET. Used by the health prober, which
    /// already owns its own cadence and timeout.
    pub async fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        Ok(response.text().await?)
    }

    pub async fn get_enhanced(&self, url: &str) -> Result<String> {
        self.rate_limiter.until_ready().await;
        debug!(url, "enhanced GET");
        let response = self.enhanced.get(url).send().await.map_err(|e| anyhow!("GET {url} failed: {e}"))?;
        response.text().await.map_err(|e| anyhow!("reading response body failed: {e}"))
    }

    pub async fn get_json_enhanced<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;
        let response = self.enhanced.get(url).send().await.map_err(|e| anyhow!("GET {url} failed: {e}"))?;
        response.json::<T>().await.map_err(|e| anyhow!("parsing JSON body failed: {e}"))
    }

    pub async fn post_enhanced(&self, url: &str, body: String) -> Result<String> {
        self.rate_limiter.until_ready().await;
        let response = self
            .enhanced
            .post(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| anyhow!("POST {url} failed: {e}"))?;
        response.text().await.map_err(|e| anyhow!("reading response body failed: {e}"))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new().expect("failed to build default HTTP client")
    }
}

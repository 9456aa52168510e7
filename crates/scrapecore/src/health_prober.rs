//! Background health probing: a ticking task that GETs a health URL through
//! every proxy and reports the outcome back to the registry.

use crate::cancel::CancellationToken;
use crate::registry::ProxyRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct HealthProberConfig {
    pub check_interval: Duration,
    pub health_url: String,
    pub probe_timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for HealthProberConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            health_url: "http://httpbin.org/ip".to_string(),
            probe_timeout: Duration::from_secs(10),
            max_concurrency: 20,
        }
    }
}

pub struct HealthProber {
    registry: Arc<ProxyRegistry>,
    client: reqwest::Client,
    config: HealthProberConfig,
}

impl HealthProber {
    pub fn new(registry: Arc<ProxyRegistry>, client: reqwest::Client, config: HealthProberConfig) -> Self {
        Self { registry, client, config }
    }

    /// Runs until cancelled. Each tick probes every currently-tracked proxy
    /// concurrently, bounded by `max_concurrency`; the next tick only begins
    /// once this one's probes have all completed or timed out.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.check_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("health prober stopping");
                    return;
                }
                _ = interval.tick() => {
                    self.probe_all().await;
                }
            }
        }
    }

    async fn probe_all(&self) {
        let proxies = self.registry.list_available().await;
        if proxies.is_empty() {
            return;
        }
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut handles = Vec::with_capacity(proxies.len());

        for proxy in proxies {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            let registry = self.registry.clone();
            let url = self.config.health_url.clone();
            let probe_timeout = self.config.probe_timeout;
            let proxy_id = proxy.id().to_string();
            let proxy_url = proxy.descriptor.to_url();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                let started = Instant::now();
                let proxy_cfg = match reqwest::Proxy::all(&proxy_url) {
                    Ok(p) => p,
                    Err(e) => {
                        registry.report_failure(&proxy_id, &e.to_string()).await;
                        return;
                    }
                };
                let probe_client = client.clone().into();
                let result = timeout(probe_timeout, probe_once(probe_client, proxy_cfg, &url)).await;

                match result {
                    Ok(Ok(true)) => {
                        registry.report_success(&proxy_id).await;
                        let mut status = proxy.status.lock().await;
                        status.last_checked = Some(Instant::now());
                        status.avg_response_time = started.elapsed();
                    }
                    Ok(Ok(false)) => registry.report_failure(&proxy_id, "non-200 health response").await,
                    Ok(Err(e)) => registry.report_failure(&proxy_id, &e.to_string()).await,
                    Err(_) => registry.report_failure(&proxy_id, "health probe timed out").await,
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("health probe task panicked: {e}");
            }
        }
    }
}

async fn probe_once(_base: reqwest::Client, proxy: reqwest::Proxy, url: &str) -> Result<bool, reqwest::Error> {
    let client = reqwest::Client::builder().proxy(proxy).build()?;
    let resp = client.get(url).send().await?;
    Ok(resp.status().is_success())
}

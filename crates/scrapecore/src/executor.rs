//! Resilient Executor: retry/backoff loop, per-operation circuit breaker,
//! and fallback dispatch.

use crate::cancel::CancellationToken;
use crate::circuit_breaker::CircuitBreaker;
use crate::error::is_retryable;
use crate::fallback::{AlternativeRoute, FallbackKind};
use crate::result_cache::ResultCache;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

#[derive(Clone)]
pub struct OperationConfig {
    pub retry: RetryConfig,
    pub fallback: Option<FallbackKind>,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self { retry: RetryConfig::default(), fallback: None }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub value: Option<Value>,
    pub attempts: u32,
    pub used_fallback: bool,
    pub fallback_kind: Option<String>,
    pub original_error: Option<String>,
}

pub struct ResilientExecutor {
    breakers: Mutex<HashMap<String, Arc<Mutex<CircuitBreaker>>>>,
    configs: Mutex<HashMap<String, OperationConfig>>,
    cache: ResultCache,
}

impl ResilientExecutor {
    pub fn new(cache_max_age: Duration) -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
            configs: Mutex::new(HashMap::new()),
            cache: ResultCache::new(cache_max_age),
        }
    }

    pub async fn configure_operation(&self, name: &str, config: OperationConfig) {
        self.configs.lock().await.insert(name.to_string(), config);
    }

    async fn breaker_for(&self, name: &str) -> Arc<Mutex<CircuitBreaker>> {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CircuitBreaker::with_defaults(name))))
            .clone()
    }

    async fn config_for(&self, name: &str) -> OperationConfig {
        self.configs.lock().await.get(name).cloned().unwrap_or_default()
    }

    /// Runs `op_fn` with retry/backoff, a per-operation circuit breaker, and
    /// configured fallback dispatch. `op_fn` returns `Err(message)` on
    /// failure; `message` drives the canonical retry predicate.
    pub async fn execute<F, Fut>(
        &self,
        operation_name: &str,
        op_fn: F,
        cancel: &CancellationToken,
    ) -> ExecutionResult
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, String>>,
    {
        let config = self.config_for(operation_name).await;
        let breaker = self.breaker_for(operation_name).await;

        let mut attempts = 0u32;
        let mut last_error: Option<String> = None;

        let breaker_open = !breaker.lock().await.can_execute();
        if breaker_open {
            last_error = Some(format!("circuit breaker for '{operation_name}' is open"));
        } else {
            loop {
                if cancel.is_cancelled() {
                    last_error = Some("operation cancelled".to_string());
                    break;
                }
                attempts += 1;
                match op_fn().await {
                    Ok(value) => {
                        breaker.lock().await.record_success();
                        if matches!(config.fallback, Some(FallbackKind::Cached)) {
                            self.cache.put(operation_name, value.clone()).await;
                        }
                        return ExecutionResult {
                            success: true,
                            value: Some(value),
                            attempts,
                            used_fallback: false,
                            fallback_kind: None,
                            original_error: None,
                        };
                    }
                    Err(message) => {
                        debug!("operation '{operation_name}' attempt {attempts} failed: {message}");
                        let retryable = is_retryable(&message);
                        last_error = Some(message);
                        if !retryable || attempts > config.retry.max_retries {
                            break;
                        }
                        let delay = backoff_delay(&config.retry, attempts);
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = cancel.cancelled() => {
                                last_error = Some("operation cancelled".to_string());
                                break;
                            }
                        }
                    }
                }
            }
            breaker.lock().await.record_failure();
        }

        self.dispatch_fallback(operation_name, &config, attempts, last_error).await
    }

    async fn dispatch_fallback(
        &self,
        operation_name: &str,
        config: &OperationConfig,
        attempts: u32,
        original_error: Option<String>,
    ) -> ExecutionResult {
        match &config.fallback {
            None => ExecutionResult {
                success: false,
                value: None,
                attempts,
                used_fallback: false,
                fallback_kind: None,
                original_error,
            },
            Some(FallbackKind::Default(value)) => ExecutionResult {
                success: true,
                value: Some(value.clone()),
                attempts,
                used_fallback: true,
                fallback_kind: Some("default".to_string()),
                original_error,
            },
            Some(FallbackKind::Degrade(value)) => ExecutionResult {
                success: true,
                value: Some(value.clone()),
                attempts,
                used_fallback: true,
                fallback_kind: Some("degrade".to_string()),
                original_error,
            },
            Some(FallbackKind::Cached) => match self.cache.get(operation_name).await {
                Some(value) => ExecutionResult {
                    success: true,
                    value: Some(value),
                    attempts,
                    used_fallback: true,
                    fallback_kind: Some("cached".to_string()),
                    original_error,
                },
                None => {
                    warn!("cached fallback requested for '{operation_name}' but no cache entry available");
                    ExecutionResult {
                        success: false,
                        value: None,
                        attempts,
                        used_fallback: false,
                        fallback_kind: Some("cached".to_string()),
                        original_error,
                    }
                }
            },
            Some(FallbackKind::Alternative(route)) => match route {
                AlternativeRoute::CachedAlternative => match self.cache.get(operation_name).await {
                    Some(value) => ExecutionResult {
                        success: true,
                        value: Some(value),
                        attempts,
                        used_fallback: true,
                        fallback_kind: Some("alternative:cached".to_string()),
                        original_error,
                    },
                    None => ExecutionResult {
                        success: false,
                        value: None,
                        attempts,
                        used_fallback: false,
                        fallback_kind: Some("alternative:cached".to_string()),
                        original_error,
                    },
                },
                other => ExecutionResult {
                    success: false,
                    value: None,
                    attempts,
                    used_fallback: false,
                    fallback_kind: Some(format!("alternative:{other:?}")),
                    original_error,
                },
            },
        }
    }
}

fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let scaled = retry.base_delay.as_secs_f64() * retry.backoff_factor.powi(attempt as i32 - 1);
    Duration::from_secs_f64(scaled.min(retry.max_delay.as_secs_f64()))
}

//! Enricher: sequential or parallel fan-out across plugins that add fields
//! to a record. Failures are non-fatal; successful outputs still merge.

use super::value::Value;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;
    async fn enrich(&self, record: &BTreeMap<String, Value>) -> Result<BTreeMap<String, Value>, String>;
}

pub async fn enrich_sequential(
    enrichers: &[Box<dyn Enricher>],
    record: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, Value>, String> {
    let mut current = record.clone();
    for enricher in enrichers {
        let additions = enricher.enrich(&current).await?;
        merge_with_collision_prefix(&mut current, additions, enricher.name());
    }
    Ok(current)
}

/// Fans out to every enricher concurrently, bounded by `timeout`. Partial
/// failure is not fatal: successful outputs merge; failures are collected
/// into a single joined error string.
pub async fn enrich_parallel(
    enrichers: &[Box<dyn Enricher>],
    record: &BTreeMap<String, Value>,
    timeout: Duration,
) -> (BTreeMap<String, Value>, Option<String>) {
    let futures = enrichers.iter().map(|enricher| {
        let record = record.clone();
        async move {
            let result = tokio::time::timeout(timeout, enricher.enrich(&record)).await;
            match result {
                Ok(Ok(additions)) => Ok((enricher.name().to_string(), additions)),
                Ok(Err(e)) => Err(format!("{}: {e}", enricher.name())),
                Err(_) => Err(format!("{}: timed out", enricher.name())),
            }
        }
    });

    let results = join_all(futures).await;
    let mut merged = record.clone();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok((name, additions)) => merge_with_collision_prefix(&mut merged, additions, &name),
            Err(e) => {
                warn!("enricher failed: {e}");
                errors.push(e);
            }
        }
    }
    let joined_error = if errors.is_empty() { None } else { Some(errors.join("; ")) };
    (merged, joined_error)
}

fn merge_with_collision_prefix(base: &mut BTreeMap<String, Value>, additions: BTreeMap<String, Value>, enricher_name: &str) {
    for (key, value) in additions {
        if base.contains_key(&key) {
            base.insert(format!("{enricher_name}_{key}"), value);
        } else {
            base.insert(key, value);
        }
    }
}

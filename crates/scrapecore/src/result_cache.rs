//! Bounded cache of last-known-good results per operation, used by the
//! Cached fallback kind.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
struct Entry {
    value: serde_json::Value,
    stored_at: Instant,
}

pub struct ResultCache {
    entries: RwLock<HashMap<String, Entry>>,
    max_age: Duration,
}

impl ResultCache {
    pub fn new(max_age: Duration) -> Self {
        Self { entries: RwLock::new(HashMap::new()), max_age }
    }

    pub async fn put(&self, operation: &str, value: serde_json::Value) {
        self.entries.write().await.insert(
            operation.to_string(),
            Entry { value, stored_at: Instant::now() },
        );
    }

    /// Returns the cached value iff it exists and is within `max_age`.
    pub async fn get(&self, operation: &str) -> Option<serde_json::Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(operation)?;
        if entry.stored_at.elapsed() <= self.max_age {
            Some(entry.value.clone())
        } else {
            None
        }
    }
}

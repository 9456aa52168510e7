//! Deduplicator: hash, composite-field-key, or Jaccard-similarity modes with
//! bounded, FIFO-evicted caches.

use super::value::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
pub enum DedupMethod {
    Hash,
    Field { fields: Vec<String> },
    Similarity { fields: Vec<String>, threshold: f64 },
}

#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub method: DedupMethod,
    pub cache_size: usize,
    /// The teacher source returns records unchanged even on detected
    /// duplicates; this flag lets a caller opt into actually dropping them.
    pub drop_duplicates: bool,
}

enum State {
    Hashes(VecDeque<String>),
    Similarity(VecDeque<BTreeMap<String, Value>>),
}

pub struct Deduplicator {
    config: DedupConfig,
    state: State,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Self {
        let state = match &config.method {
            DedupMethod::Hash | DedupMethod::Field { .. } => State::Hashes(VecDeque::new()),
            DedupMethod::Similarity { .. } => State::Similarity(VecDeque::new()),
        };
        Self { config, state }
    }

    /// Returns `true` if `record` is a duplicate of something already seen.
    /// When `drop_duplicates` is false the record is always returned
    /// unchanged by the caller regardless of this result.
    pub fn check(&mut self, record: &BTreeMap<String, Value>) -> bool {
        match &self.config.method {
            DedupMethod::Hash => {
                let hash = Value::Map(record.clone()).canonical_json();
                let hash = hex::encode(Sha256::digest(hash.as_bytes()));
                self.check_hash(hash)
            }
            DedupMethod::Field { fields } => {
                let composite = fields
                    .iter()
                    .map(|f| record.get(f).map(Value::to_display_string).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join("|");
                let hash = hex::encode(Sha256::digest(composite.as_bytes()));
                self.check_hash(hash)
            }
            DedupMethod::Similarity { fields, threshold } => {
                let threshold = *threshold;
                let fields = fields.clone();
                let State::Similarity(seen) = &mut self.state else { unreachable!() };
                let is_dup = seen.iter().any(|prior| jaccard(prior, record, &fields) >= threshold);
                seen.push_back(record.clone());
                if seen.len() > self.config.cache_size {
                    seen.pop_front();
                }
                is_dup
            }
        }
    }

    fn check_hash(&mut self, hash: String) -> bool {
        let State::Hashes(seen) = &mut self.state else { unreachable!() };
        if seen.contains(&hash) {
            return true;
        }
        seen.push_back(hash);
        if seen.len() > self.config.cache_size {
            seen.pop_front();
        }
        false
    }

    pub fn cache_len(&self) -> usize {
        match &self.state {
            State::Hashes(h) => h.len(),
            State::Similarity(s) => s.len(),
        }
    }
}

fn jaccard(a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>, fields: &[String]) -> f64 {
    let keys: Vec<&String> = if fields.is_empty() {
        let mut all: Vec<&String> = a.keys().chain(b.keys()).collect();
        all.sort();
        all.dedup();
        all
    } else {
        fields.iter().collect()
    };
    if keys.is_empty() {
        return 1.0;
    }
    let mut matches = 0usize;
    for key in &keys {
        let av = a.get(*key).map(Value::to_display_string);
        let bv = b.get(*key).map(Value::to_display_string);
        if av.is_some() && av == bv {
            matches += 1;
        }
    }
    matches as f64 / keys.len() as f64
}

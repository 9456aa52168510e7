//! Data Pipeline Core: Extract -> Transform -> Validate -> Deduplicate -> Enrich.

pub mod dedup;
pub mod enrich;
pub mod extract;
pub mod transform;
pub mod validate;
pub mod value;

use crate::cancel::CancellationToken;
use chrono::{DateTime, Utc};
use dedup::Deduplicator;
use enrich::Enricher;
use extract::SelectorRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use transform::TransformRule;
use validate::ValidationRule;
use value::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordError {
    pub stage: String,
    pub message: String,
    pub fatal: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub processing_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub stage_reached: String,
}

#[derive(Debug, Clone)]
pub struct ProcessedRecord {
    pub raw: String,
    pub extracted: BTreeMap<String, Value>,
    pub transformed: BTreeMap<String, Value>,
    pub validated: BTreeMap<String, Value>,
    pub enriched: BTreeMap<String, Value>,
    pub metadata: RecordMetadata,
    pub errors: Vec<RecordError>,
}

#[derive(Clone)]
pub struct FieldTransformSpec {
    pub field: String,
    pub rules: Vec<TransformRule>,
}

pub struct PipelineConfig {
    pub selector_rules: Vec<SelectorRule>,
    pub global_transforms: Vec<TransformRule>,
    pub field_transforms: Vec<FieldTransformSpec>,
    pub validation_rules: Vec<ValidationRule>,
    pub strict_validation: bool,
    pub enrichment_timeout: Duration,
    pub parallel_enrichment: bool,
    pub per_record_timeout: Duration,
    pub batch_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            selector_rules: vec![],
            global_transforms: vec![],
            field_transforms: vec![],
            validation_rules: vec![],
            strict_validation: true,
            enrichment_timeout: Duration::from_secs(5),
            parallel_enrichment: false,
            per_record_timeout: Duration::from_secs(30),
            batch_workers: 10,
        }
    }
}

pub struct PipelineOrchestrator {
    config: PipelineConfig,
    enrichers: Vec<Box<dyn Enricher>>,
    dedup: Mutex<Deduplicator>,
}

impl PipelineOrchestrator {
    pub fn new(config: PipelineConfig, enrichers: Vec<Box<dyn Enricher>>, dedup: Deduplicator) -> Self {
        Self { config, enrichers, dedup: Mutex::new(dedup) }
    }

    pub async fn process(&self, raw: String, processing_id: String) -> ProcessedRecord {
        let started_at = Utc::now();
        let started_instant = Instant::now();
        let mut errors = Vec::new();
        let mut stage_reached = "none".to_string();

        let extracted = match extract::extract(&raw, &self.config.selector_rules) {
            Ok(extracted) => {
                stage_reached = "extract".to_string();
                extracted
            }
            Err(e) => {
                errors.push(fatal_error("extract", e.to_string()));
                return finish(raw, BTreeMap::new(), BTreeMap::new(), BTreeMap::new(), BTreeMap::new(), processing_id, started_at, started_instant, stage_reached, errors);
            }
        };

        let transformed = match self.run_transform(&extracted) {
            Ok(transformed) => {
                stage_reached = "transform".to_string();
                transformed
            }
            Err(e) => {
                errors.push(fatal_error("transform", e.to_string()));
                return finish(raw, extracted, BTreeMap::new(), BTreeMap::new(), BTreeMap::new(), processing_id, started_at, started_instant, stage_reached, errors);
            }
        };

        let mut validated = transformed.clone();
        match validate::validate(&mut validated, &self.config.validation_rules, self.config.strict_validation) {
            Ok(warnings) => {
                stage_reached = "validate".to_string();
                for w in warnings {
                    errors.push(non_fatal_error("validate", w));
                }
            }
            Err(e) => {
                errors.push(fatal_error("validate", e.to_string()));
                return finish(raw, extracted, transformed, BTreeMap::new(), BTreeMap::new(), processing_id, started_at, started_instant, stage_reached, errors);
            }
        }

        {
            let mut dedup = self.dedup.lock().await;
            if dedup.check(&validated) {
                errors.push(non_fatal_error("deduplicate", "record is a duplicate of a previously seen record".to_string()));
            }
        }
        stage_reached = "deduplicate".to_string();

        let enriched = if self.enrichers.is_empty() {
            validated.clone()
        } else if self.config.parallel_enrichment {
            let (merged, err) = enrich::enrich_parallel(&self.enrichers, &validated, self.config.enrichment_timeout).await;
            if let Some(e) = err {
                errors.push(non_fatal_error("enrich", e));
            }
            merged
        } else {
            match enrich::enrich_sequential(&self.enrichers, &validated).await {
                Ok(merged) => merged,
                Err(e) => {
                    errors.push(non_fatal_error("enrich", e));
                    validated.clone()
                }
            }
        };
        stage_reached = "completed".to_string();

        finish(raw, extracted, transformed, validated, enriched, processing_id, started_at, started_instant, stage_reached, errors)
    }

    fn run_transform(&self, extracted: &BTreeMap<String, Value>) -> Result<BTreeMap<String, Value>, crate::error::CoreError> {
        let mut out = BTreeMap::new();
        for (key, value) in extracted {
            let mut s = match value.as_str() {
                Some(s) => s.to_string(),
                None => {
                    out.insert(key.clone(), value.clone());
                    continue;
                }
            };
            if !self.config.global_transforms.is_empty() {
                s = transform::apply_chain(&self.config.global_transforms, &s)?;
            }
            if let Some(spec) = self.config.field_transforms.iter().find(|f| &f.field == key) {
                s = transform::apply_chain(&spec.rules, &s)?;
            }
            out.insert(key.clone(), Value::String(s));
        }
        Ok(out)
    }

    /// Processes records through a bounded worker pool. Cancellation drains
    /// the input channel without starting new work; results collected so far
    /// are still returned.
    pub async fn process_batch(self: Arc<Self>, records: Vec<String>, cancel: CancellationToken) -> Vec<ProcessedRecord> {
        let worker_count = self.config.batch_workers.max(1);
        let (tx, rx) = mpsc::channel::<(usize, String)>(records.len().max(1));
        let rx = Arc::new(Mutex::new(rx));
        let (result_tx, mut result_rx) = mpsc::channel::<(usize, ProcessedRecord)>(records.len().max(1));

        for (idx, raw) in records.into_iter().enumerate() {
            let _ = tx.send((idx, raw)).await;
        }
        drop(tx);

        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx = rx.clone();
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();
            let pipeline = self.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        return;
                    }
                    let next = rx.lock().await.recv().await;
                    let Some((idx, raw)) = next else { return };
                    let record = pipeline.process(raw, format!("rec-{idx}")).await;
                    if result_tx.send((idx, record)).await.is_err() {
                        return;
                    }
                }
            }));
        }
        drop(result_tx);

        let mut collected = Vec::new();
        while let Some(item) = result_rx.recv().await {
            collected.push(item);
        }
        for handle in handles {
            let _ = handle.await;
        }
        collected.sort_by_key(|(idx, _)| *idx);
        collected.into_iter().map(|(_, record)| record).collect()
    }
}

fn fatal_error(stage: &str, message: String) -> RecordError {
    debug!("pipeline stage '{stage}' fatal error: {message}");
    RecordError { stage: stage.to_string(), message, fatal: true, timestamp: Utc::now() }
}

fn non_fatal_error(stage: &str, message: String) -> RecordError {
    RecordError { stage: stage.to_string(), message, fatal: false, timestamp: Utc::now() }
}

#[allow(clippy::too_many_arguments)]
fn finish(
    raw: String,
    extracted: BTreeMap<String, Value>,
    transformed: BTreeMap<String, Value>,
    validated: BTreeMap<String, Value>,
    enriched: BTreeMap<String, Value>,
    processing_id: String,
    started_at: DateTime<Utc>,
    started_instant: Instant,
    stage_reached: String,
    errors: Vec<RecordError>,
) -> ProcessedRecord {
    ProcessedRecord {
        raw,
        extracted,
        transformed,
        validated,
        enriched,
        metadata: RecordMetadata {
            processing_id,
            started_at,
            duration_ms: started_instant.elapsed().as_millis() as u64,
            stage_reached,
        },
        errors,
    }
}

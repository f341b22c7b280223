// src/pipeline.rs
//! Ingestion run: fetch all sources → merge curated entries → validate and
//! categorize → one bulk insert. Each stage consumes the full output of the
//! previous one. Source failures are collected into the report; only a store
//! failure aborts the run.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use serde::Serialize;

use crate::categorize::categorize_all;
use crate::error::{PipelineError, SourceFailure};
use crate::ingest::config::SourcesConfig;
use crate::ingest::fetch::{fetch_all, FetchOptions};
use crate::ingest::types::{SourceAdapter, SourceDescriptor};
use crate::ingest::{ensure_metrics_described, validate_items};
use crate::model::ContentItem;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStage {
    Idle,
    Fetching,
    Categorizing,
    Persisting,
    Done,
}

impl RunStage {
    pub fn next(self) -> Option<RunStage> {
        match self {
            RunStage::Idle => Some(RunStage::Fetching),
            RunStage::Fetching => Some(RunStage::Categorizing),
            RunStage::Categorizing => Some(RunStage::Persisting),
            RunStage::Persisting => Some(RunStage::Done),
            RunStage::Done => None,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.next() {
            tracing::debug!(target: "pipeline", from = ?*self, to = ?next, "stage");
            *self = next;
        }
    }
}

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Rows newly created in the store.
    pub new_count: u64,
    /// Items produced by adapters (curated entries not included).
    pub fetched: usize,
    /// Items dropped by validation.
    pub dropped: usize,
    pub failures: Vec<SourceFailure>,
    pub duration_ms: u64,
}

/// Wires an adapter and a store together. Cheap to share behind an `Arc`.
pub struct Pipeline {
    store: Store,
    adapter: Arc<dyn SourceAdapter>,
    options: FetchOptions,
}

impl Pipeline {
    pub fn new(store: Store, adapter: Arc<dyn SourceAdapter>, options: FetchOptions) -> Self {
        Self {
            store,
            adapter,
            options,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn options(&self) -> FetchOptions {
        self.options
    }

    /// Run against a loaded catalogue.
    pub async fn run_ingestion(&self, catalogue: &SourcesConfig) -> Result<RunReport, PipelineError> {
        self.run(&catalogue.sources, &catalogue.manual).await
    }

    pub async fn run(
        &self,
        sources: &[SourceDescriptor],
        manual: &[ContentItem],
    ) -> Result<RunReport, PipelineError> {
        ensure_metrics_described();
        counter!("ingest_runs_total").increment(1);
        let t0 = Instant::now();
        let mut stage = RunStage::Idle;

        stage.advance();
        let outcome = fetch_all(self.adapter.as_ref(), sources, self.options).await;
        let fetched = outcome.items.len();
        let mut items = outcome.items;
        items.extend(manual.iter().cloned());

        stage.advance();
        let (valid, dropped) = validate_items(items);
        let categorized = categorize_all(valid);
        counter!("ingest_items_dropped_total").increment(dropped as u64);

        stage.advance();
        let new_count = match self.store.bulk_insert(&categorized).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(target: "pipeline", error = %e, "persisting failed, run abandoned");
                return Err(e.into());
            }
        };
        counter!("ingest_items_new_total").increment(new_count);

        stage.advance();
        let duration_ms = u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX);
        histogram!("ingest_run_ms").record(duration_ms as f64);
        gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        tracing::info!(
            target: "pipeline",
            sources = sources.len(),
            fetched,
            manual = manual.len(),
            dropped,
            new = new_count,
            failed = outcome.failures.len(),
            duration_ms,
            "ingest run done"
        );

        Ok(RunReport {
            new_count,
            fetched,
            dropped,
            failures: outcome.failures,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order_and_stop_at_done() {
        let mut s = RunStage::Idle;
        let mut seen = vec![s];
        while s != RunStage::Done {
            s.advance();
            seen.push(s);
        }
        assert_eq!(
            seen,
            vec![
                RunStage::Idle,
                RunStage::Fetching,
                RunStage::Categorizing,
                RunStage::Persisting,
                RunStage::Done
            ]
        );
        s.advance();
        assert_eq!(s, RunStage::Done);
    }
}

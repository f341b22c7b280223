// src/ingest/fetch.rs
//! Bounded fan-out over all configured sources.
//!
//! Every source is fetched exactly once with at most `concurrency` calls in
//! flight. Each call is capped by `timeout`; a timeout is recorded like any
//! other per-source failure and contributes no items. A finished call frees
//! its slot immediately; results are re-sorted into source order afterwards,
//! so output is deterministic regardless of completion order.

use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};

use crate::error::SourceFailure;
use crate::ingest::ensure_metrics_described;
use crate::ingest::types::{SourceAdapter, SourceDescriptor};
use crate::model::ContentItem;

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub items: Vec<ContentItem>,
    pub failures: Vec<SourceFailure>,
}

async fn fetch_one(
    adapter: &dyn SourceAdapter,
    source: &SourceDescriptor,
    timeout: Duration,
) -> Result<Vec<ContentItem>, SourceFailure> {
    let t0 = Instant::now();
    let res = match tokio::time::timeout(timeout, adapter.fetch(source)).await {
        Ok(Ok(items)) => Ok(items),
        Ok(Err(e)) => Err(SourceFailure::from_error(&source.name, &e)),
        Err(_) => Err(SourceFailure::new(
            &source.name,
            format!("timed out after {timeout:?}"),
        )),
    };
    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    res
}

/// Fetch every source once, at most `opts.concurrency` at a time.
pub async fn fetch_all(
    adapter: &dyn SourceAdapter,
    sources: &[SourceDescriptor],
    opts: FetchOptions,
) -> FetchOutcome {
    ensure_metrics_described();
    let limit = opts.concurrency.max(1);

    type Slot<'a> = BoxFuture<'a, (usize, Result<Vec<ContentItem>, SourceFailure>)>;
    let calls: Vec<Slot<'_>> = sources
        .iter()
        .enumerate()
        .map(|(idx, src)| async move { (idx, fetch_one(adapter, src, opts.timeout).await) }.boxed())
        .collect();

    let mut results: Vec<_> = stream::iter(calls).buffer_unordered(limit).collect().await;
    results.sort_by_key(|(idx, _)| *idx);

    let mut out = FetchOutcome::default();
    for (idx, res) in results {
        let src = &sources[idx];
        match res {
            Ok(mut items) => {
                tracing::debug!(target: "ingest", source = %src.name, items = items.len(), "source fetched");
                counter!("ingest_items_fetched_total").increment(items.len() as u64);
                out.items.append(&mut items);
            }
            Err(failure) => {
                tracing::warn!(
                    target: "ingest",
                    source = %failure.source,
                    adapter = adapter.name(),
                    reason = %failure.reason,
                    "source failed"
                );
                counter!("ingest_source_failures_total").increment(1);
                out.failures.push(failure);
            }
        }
    }

    out
}

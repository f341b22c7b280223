// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::config::{load_sources_default, SourcesConfig};
use crate::pipeline::Pipeline;

/// Where each tick gets its catalogue from.
#[derive(Debug, Clone)]
pub enum CatalogueSource {
    /// Fixed catalogue captured at spawn time.
    Fixed(SourcesConfig),
    /// Re-resolve via `load_sources_default` on every tick; a load error skips the tick.
    Reload,
}

/// Spawn a background task that runs ingestion every `interval`.
/// The first run happens immediately. Ticks never overlap: a run that
/// outlasts the interval delays the next one instead of stacking.
pub fn spawn_periodic(
    pipeline: Arc<Pipeline>,
    catalogue: CatalogueSource,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;

            let cfg = match &catalogue {
                CatalogueSource::Fixed(cfg) => cfg.clone(),
                CatalogueSource::Reload => match load_sources_default() {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        tracing::warn!(target: "ingest", error = %format!("{e:#}"), "catalogue reload failed, skipping tick");
                        continue;
                    }
                },
            };

            match pipeline.run_ingestion(&cfg).await {
                Ok(report) => tracing::info!(
                    target: "ingest",
                    new = report.new_count,
                    failed = report.failures.len(),
                    "scheduled ingest tick"
                ),
                Err(e) => tracing::error!(target: "ingest", error = %e, "scheduled ingest failed"),
            }
        }
    })
}

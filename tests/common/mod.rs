// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use resource_aggregator::ingest::types::{SourceAdapter, SourceDescriptor};
use resource_aggregator::model::ContentItem;
use resource_aggregator::Store;

/// What a scripted source does when fetched.
#[derive(Clone)]
pub struct Script {
    pub delay: Duration,
    pub outcome: Result<Vec<ContentItem>, String>,
}

impl Script {
    pub fn items(items: Vec<ContentItem>) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(items),
        }
    }

    pub fn fail(reason: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(reason.to_string()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Adapter keyed by source name; tracks calls and peak in-flight fetches.
#[derive(Default)]
pub struct ScriptedAdapter {
    scripts: HashMap<String, Script>,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &str, script: Script) -> Self {
        self.scripts.insert(source.to_string(), script);
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<ContentItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(self.in_flight.clone());
        self.peak.fetch_max(now, Ordering::SeqCst);

        let script = self
            .scripts
            .get(&source.name)
            .cloned()
            .ok_or_else(|| anyhow!("unscripted source {}", source.name))?;
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        script.outcome.map_err(|reason| anyhow!(reason))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn feed(name: &str) -> SourceDescriptor {
    SourceDescriptor::feed(name, format!("https://{}.test/feed", name.to_lowercase()))
}

pub fn item(title: &str, url: &str, source: &str) -> ContentItem {
    ContentItem::new(title, source).with_url(url)
}

pub async fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("items.db")).await.unwrap();
    (dir, store)
}

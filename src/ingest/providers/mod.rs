// src/ingest/providers/mod.rs
pub mod feed;
pub mod page;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::ingest::types::{SourceAdapter, SourceDescriptor, SourceKind};
use crate::model::ContentItem;

fn parse_body(body: &str, source: &SourceDescriptor) -> Result<Vec<ContentItem>> {
    let now = Utc::now();
    match source.kind {
        SourceKind::Feed => feed::parse_feed(body, source, now),
        SourceKind::Scrape => page::parse_page(body, source, now),
    }
}

/// Fetches sources over HTTP and parses them according to their kind.
pub struct HttpAdapter {
    client: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceAdapter for HttpAdapter {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<ContentItem>> {
        let body = self
            .client
            .get(&source.address)
            .send()
            .await
            .with_context(|| format!("GET {}", source.address))?
            .error_for_status()
            .context("upstream status")?
            .text()
            .await
            .context("reading body")?;
        parse_body(&body, source)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves canned documents keyed by source address; no network.
#[derive(Default)]
pub struct FixtureAdapter {
    bodies: HashMap<String, String>,
}

impl FixtureAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, address: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(address.into(), body.into());
        self
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<ContentItem>> {
        let body = self
            .bodies
            .get(&source.address)
            .ok_or_else(|| anyhow!("no fixture for {}", source.address))?;
        parse_body(body, source)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

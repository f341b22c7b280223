// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::{Category, ContentItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// RSS 2.0, RSS 1.0 (RDF) or Atom document.
    #[serde(alias = "rss", alias = "atom")]
    Feed,
    /// HTML page read through a [`ScrapeSchema`].
    Scrape,
}

/// CSS selectors used to pull items out of a scraped page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSchema {
    #[serde(alias = "item")]
    pub container: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Default for ScrapeSchema {
    fn default() -> Self {
        Self {
            container: "article".to_string(),
            title: "h2, h3, a".to_string(),
            link: "a".to_string(),
            summary: Some("p".to_string()),
        }
    }
}

/// One configured upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(alias = "url")]
    pub address: String,
    #[serde(alias = "type")]
    pub kind: SourceKind,
    /// Applied to every item from this source; skips the categorizer.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub selectors: Option<ScrapeSchema>,
}

impl SourceDescriptor {
    pub fn feed(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            kind: SourceKind::Feed,
            category: None,
            selectors: None,
        }
    }

    pub fn scrape(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Scrape,
            ..Self::feed(name, address)
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_selectors(mut self, schema: ScrapeSchema) -> Self {
        self.selectors = Some(schema);
        self
    }

    pub fn schema(&self) -> ScrapeSchema {
        self.selectors.clone().unwrap_or_default()
    }
}

/// Turns one source into items. Implementations are stateless and re-entrant;
/// an `Err` is scoped to the given source only.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<ContentItem>>;

    fn name(&self) -> &'static str;
}

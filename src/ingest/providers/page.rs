// src/ingest/providers/page.rs
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::ingest::{normalize_plain, plain_excerpt};
use crate::ingest::types::SourceDescriptor;
use crate::model::ContentItem;

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid selector {raw:?}: {e}"))
}

fn first_text(el: &ElementRef<'_>, sel: &Selector) -> String {
    el.select(sel)
        .next()
        .map(|t| normalize_plain(&t.text().collect::<String>()))
        .unwrap_or_default()
}

/// Resolve `href` against the page address; only http(s) targets survive.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Extract one item per schema container that has both a title and a link.
pub fn parse_page(
    html: &str,
    source: &SourceDescriptor,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<ContentItem>> {
    let base = Url::parse(&source.address)
        .with_context(|| format!("invalid page address {:?}", source.address))?;
    let schema = source.schema();
    let container = selector(&schema.container)?;
    let title_sel = selector(&schema.title)?;
    let link_sel = selector(&schema.link)?;
    let summary_sel = schema.summary.as_deref().map(selector).transpose()?;

    let document = Html::parse_document(html);
    let mut out = Vec::new();

    for el in document.select(&container) {
        let title = first_text(&el, &title_sel);
        if title.is_empty() {
            continue;
        }
        let Some(url) = el
            .select(&link_sel)
            .find_map(|a| a.value().attr("href"))
            .and_then(|href| resolve_link(&base, href))
        else {
            continue;
        };
        let summary = summary_sel
            .as_ref()
            .map(|s| first_text(&el, s))
            .and_then(|s| plain_excerpt(&s));

        out.push(ContentItem {
            title,
            url: Some(url),
            summary,
            source: source.name.clone(),
            category: source.category,
            published_at: Some(fetched_at),
        });
    }

    tracing::debug!(target: "ingest", source = %source.name, items = out.len(), "scraped page");
    Ok(out)
}

// src/ingest/providers/feed.rs
//! Syndication parsing: RSS 2.0 (`channel/item`), RSS 1.0 / RDF (root-level
//! `item`) and Atom (`entry`) all land in the same [`FeedDoc`].

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::types::SourceDescriptor;
use crate::ingest::{excerpt, title_or_placeholder};
use crate::model::ContentItem;

#[derive(Debug, Deserialize)]
struct FeedDoc {
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(default)]
    item: Vec<RssItem>,
    #[serde(default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct Channel {
    #[serde(default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

// Field names are local names: `content:encoded` arrives as `encoded`,
// `dc:date` as `date`, and `atom:link` / `media:title` collide with the plain
// RSS elements, so repeatable fields are lists and the first usable value wins.
#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(default)]
    link: Vec<RssLink>,
    guid: Option<TextNode>,
    #[serde(default)]
    description: Vec<TextNode>,
    #[serde(default)]
    encoded: Vec<TextNode>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(default)]
    date: Vec<TextNode>,
}

/// `<link>url</link>` or `<atom:link href=".."/>`.
#[derive(Debug, Deserialize)]
struct RssLink {
    #[serde(rename = "$text", default)]
    value: String,
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Vec<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(default)]
    summary: Vec<TextNode>,
    #[serde(default)]
    content: Vec<TextNode>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

fn to_utc(dt: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .and_then(to_utc)
        // chrono also accepts the obsolete named zones (EST, PDT, ...)
        .or_else(|| {
            DateTime::parse_from_rfc2822(ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .and_then(to_utc)
}

fn text(node: &Option<TextNode>) -> Option<&str> {
    node.as_ref()
        .map(|n| n.value.trim())
        .filter(|s| !s.is_empty())
}

fn first_text(nodes: &[TextNode]) -> Option<&str> {
    nodes.iter().map(|n| n.value.trim()).find(|s| !s.is_empty())
}

fn is_http(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Undefined-in-XML HTML entities that feeds leak into their markup.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

impl RssItem {
    fn url(&self) -> Option<String> {
        let text_link = self
            .link
            .iter()
            .map(|l| l.value.trim())
            .find(|l| !l.is_empty());
        let href_link = || {
            self.link
                .iter()
                .filter_map(|l| l.href.as_deref())
                .map(str::trim)
                .find(|h| is_http(h))
        };
        let guid_link = || text(&self.guid).filter(|g| is_http(g));
        text_link
            .or_else(href_link)
            .or_else(guid_link)
            .map(str::to_string)
    }

    fn into_content(self, source: &SourceDescriptor, fetched_at: DateTime<Utc>) -> ContentItem {
        let url = self.url();
        let summary = first_text(&self.description)
            .or_else(|| first_text(&self.encoded))
            .and_then(excerpt);
        let published_at = self
            .pub_date
            .as_deref()
            .and_then(parse_rfc2822)
            .or_else(|| first_text(&self.date).and_then(parse_rfc3339))
            .unwrap_or(fetched_at);

        ContentItem {
            title: title_or_placeholder(first_text(&self.title)),
            url,
            summary,
            source: source.name.clone(),
            category: source.category,
            published_at: Some(published_at),
        }
    }
}

impl AtomEntry {
    fn into_content(self, source: &SourceDescriptor, fetched_at: DateTime<Utc>) -> ContentItem {
        let url = self
            .links
            .iter()
            .find(|l| l.href.is_some() && matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.iter().find(|l| l.href.is_some()))
            .and_then(|l| l.href.as_deref())
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        let summary = first_text(&self.summary)
            .or_else(|| first_text(&self.content))
            .and_then(excerpt);
        let published_at = self
            .published
            .as_deref()
            .and_then(parse_rfc3339)
            .or_else(|| self.updated.as_deref().and_then(parse_rfc3339))
            .unwrap_or(fetched_at);

        ContentItem {
            title: title_or_placeholder(first_text(&self.title)),
            url,
            summary,
            source: source.name.clone(),
            category: source.category,
            published_at: Some(published_at),
        }
    }
}

/// Parse a syndication document into items attributed to `source`.
/// Entries without a publication time are stamped with `fetched_at`.
pub fn parse_feed(
    xml: &str,
    source: &SourceDescriptor,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<ContentItem>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let doc: FeedDoc = from_str(&xml_clean)
        .with_context(|| format!("parsing feed xml for {}", source.name))?;

    if doc.channel.is_none() && doc.item.is_empty() && doc.entry.is_empty() {
        bail!("document is not an RSS or Atom feed");
    }

    let rss_items = doc.channel.map(|c| c.item).unwrap_or_default();
    let mut out = Vec::with_capacity(rss_items.len() + doc.item.len() + doc.entry.len());
    for it in rss_items.into_iter().chain(doc.item) {
        out.push(it.into_content(source, fetched_at));
    }
    for e in doc.entry {
        out.push(e.into_content(source, fetched_at));
    }
    Ok(out)
}

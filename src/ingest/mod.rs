// src/ingest/mod.rs
pub mod config;
pub mod fetch;
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::model::ContentItem;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// Placeholder title for entries whose upstream title is blank.
pub const UNTITLED: &str = "(untitled)";

/// Maximum length of a stored summary, in characters.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Pipeline runs started.");
        describe_counter!(
            "ingest_items_fetched_total",
            "Items produced by source adapters."
        );
        describe_counter!(
            "ingest_items_new_total",
            "Items newly created in the store."
        );
        describe_counter!(
            "ingest_items_dropped_total",
            "Items dropped by validation."
        );
        describe_counter!(
            "ingest_source_failures_total",
            "Sources that failed to fetch, parse or finish in time."
        );
        describe_histogram!("ingest_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_histogram!("ingest_run_ms", "Whole pipeline run time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the pipeline last finished.");
    });
}

/// Normalize markup: strip tags, decode entities, then [`normalize_plain`].
/// Tags go first so escaped brackets in the text are not mistaken for markup.
pub fn normalize_text(s: &str) -> String {
    // 1) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    let out = re_tags.replace_all(s, " ");

    // 2) HTML entity decode
    normalize_plain(&html_escape::decode_html_entities(&out))
}

/// Normalize already-decoded text (XML text nodes, DOM text): quotes and
/// whitespace only. Literal `<`/`>` survive.
pub fn normalize_plain(s: &str) -> String {
    // Normalize “ ” ‘ ’ « » to ASCII quotes
    let out = s
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // Collapse whitespace (includes NBSP)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

fn cap_summary(mut out: String) -> Option<String> {
    if out.chars().count() > SUMMARY_MAX_CHARS {
        out = out.chars().take(SUMMARY_MAX_CHARS).collect();
        out = out.trim_end().to_string();
    }
    (!out.is_empty()).then_some(out)
}

/// Markup summary normalized and capped at [`SUMMARY_MAX_CHARS`];
/// `None` when nothing is left.
pub fn excerpt(s: &str) -> Option<String> {
    cap_summary(normalize_text(s))
}

/// Like [`excerpt`] for text that is already decoded.
pub fn plain_excerpt(s: &str) -> Option<String> {
    cap_summary(normalize_plain(s))
}

/// Title with the placeholder substituted for blank input. Titles are plain
/// text, so entities and angle brackets are kept as given.
pub fn title_or_placeholder(raw: Option<&str>) -> String {
    let t = raw.map(normalize_plain).unwrap_or_default();
    if t.is_empty() {
        UNTITLED.to_string()
    } else {
        t
    }
}

/// Trim fields and drop items missing a title or source.
/// Returns (valid, dropped_count).
pub fn validate_items(items: Vec<ContentItem>) -> (Vec<ContentItem>, usize) {
    let mut dropped = 0usize;
    let mut keep = Vec::with_capacity(items.len());

    for mut it in items {
        it.title = it.title.trim().to_string();
        it.source = it.source.trim().to_string();
        it.url = it
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        it.summary = it
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if it.title.is_empty() || it.source.is_empty() {
            tracing::debug!(target: "ingest", source = %it.source, url = ?it.url, "dropping invalid item");
            dropped += 1;
            continue;
        }
        keep.push(it);
    }

    (keep, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_markup_and_collapses_ws() {
        let s = "  <p>Hello,&nbsp;&nbsp;<b>world</b></p>  ";
        assert_eq!(normalize_text(s), "Hello, world");
    }

    #[test]
    fn excerpt_caps_length_and_empties_to_none() {
        let long = "word ".repeat(300);
        let e = excerpt(&long).unwrap();
        assert!(e.chars().count() <= SUMMARY_MAX_CHARS);
        assert_eq!(excerpt("   <br/> "), None);
    }

    #[test]
    fn placeholder_used_for_blank_titles() {
        assert_eq!(title_or_placeholder(None), UNTITLED);
        assert_eq!(title_or_placeholder(Some("  ")), UNTITLED);
        assert_eq!(title_or_placeholder(Some(" GPT-5 ")), "GPT-5");
    }

    #[test]
    fn decoded_titles_keep_angle_brackets() {
        assert_eq!(
            title_or_placeholder(Some("Generics <T>  in\u{00A0}Rust")),
            "Generics <T> in Rust"
        );
        assert_eq!(plain_excerpt("a &lt; b"), Some("a &lt; b".to_string()));
        assert_eq!(normalize_text("Vec&lt;u8&gt; <b>buffers</b>"), "Vec<u8> buffers");
    }

    #[test]
    fn validation_drops_items_without_title_or_source() {
        let items = vec![
            ContentItem::new("Ok", "Feed A").with_url("  "),
            ContentItem::new("   ", "Feed A"),
            ContentItem::new("No source", " "),
        ];
        let (kept, dropped) = validate_items(items);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(kept[0].url, None);
    }
}

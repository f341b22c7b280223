// src/categorize.rs
//! Keyword categorizer.
//!
//! Priority lives in [`KEYWORD_RULES`]: the first group with any keyword found
//! (case-insensitive substring) in `title + " " + summary` wins. Without a
//! match, sources that look like research outlets fall back to
//! [`Category::Reading`], everything else to [`Category::News`]. Items that
//! already carry a category are returned untouched.

use crate::model::{Category, ContentItem};

/// Ordered (category, keywords) table. Earlier rows win.
pub const KEYWORD_RULES: &[(Category, &[&str])] = &[
    (
        Category::Courses,
        &[
            "course",
            "tutorial",
            "learn",
            "introduction",
            "beginner",
            "workshop",
            "training",
            "certification",
            "lesson",
            "class",
            "bootcamp",
            "curriculum",
            "coursera",
            "edx",
            "udacity",
            "fast.ai",
            "deeplearning.ai",
        ],
    ),
    (
        Category::Reading,
        &[
            "paper",
            "research",
            "study",
            "analysis",
            "survey",
            "arxiv",
            "benchmark",
            "proceedings",
            "journal",
            "conference",
            "abstract",
        ],
    ),
    (
        Category::News,
        &[
            "release",
            "launch",
            "announce",
            "unveil",
            "introduce",
            "breakthrough",
            "update",
            "version",
            "new feature",
            "partnership",
            "breaking",
        ],
    ),
];

/// Substrings of a source name that mark it as a research outlet.
pub const RESEARCH_SOURCE_HINTS: &[&str] = &["arxiv", "research"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|k| haystack.contains(k))
}

/// Category for the given text, ignoring any pre-set category.
pub fn classify(title: &str, summary: Option<&str>, source: &str) -> Category {
    let text = format!("{} {}", title, summary.unwrap_or_default()).to_lowercase();

    for (category, keywords) in KEYWORD_RULES {
        if contains_any(&text, keywords) {
            return *category;
        }
    }

    if contains_any(&source.to_lowercase(), RESEARCH_SOURCE_HINTS) {
        Category::Reading
    } else {
        Category::News
    }
}

/// Fill in the category when missing; never overwrite an existing one.
pub fn categorize(mut item: ContentItem) -> ContentItem {
    if item.category.is_none() {
        item.category = Some(classify(&item.title, item.summary.as_deref(), &item.source));
    }
    item
}

pub fn categorize_all(items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.into_iter().map(categorize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, summary: &str, source: &str) -> ContentItem {
        let it = ContentItem::new(title, source);
        if summary.is_empty() {
            it
        } else {
            it.with_summary(summary)
        }
    }

    #[test]
    fn table_cases() {
        let cases = [
            ("Introduction to arXiv Paper Analysis", "", "Random Blog", Category::Courses),
            ("Quarterly Update", "", "Random Blog", Category::News),
            ("A Benchmark for Agents", "", "Random Blog", Category::Reading),
            ("New model", "We RELEASE weights today", "Lab", Category::News),
            ("Scaling laws revisited", "", "arXiv cs.LG", Category::Reading),
            ("Scaling laws revisited", "", "Microsoft Research Blog", Category::Reading),
            ("Scaling laws revisited", "", "Some Blog", Category::News),
            ("Hands-on WORKSHOP", "", "arXiv cs.AI", Category::Courses),
            ("Conference proceedings roundup", "", "Some Blog", Category::Reading),
            ("Journal club notes", "", "Some Blog", Category::Reading),
            ("Cloud certification path", "", "Some Blog", Category::Courses),
            ("Weekly roundup", "Lesson 3 of the series", "Some Blog", Category::Courses),
            ("Lab unveils a new chip", "", "Some Blog", Category::News),
            ("Strategic partnership signed", "", "Some Blog", Category::News),
            ("Model v2", "A new feature for agents", "Some Blog", Category::News),
        ];
        for (title, summary, source, want) in cases {
            let got = categorize(item(title, summary, source)).category;
            assert_eq!(got, Some(want), "title={title:?} source={source:?}");
        }
    }

    #[test]
    fn preset_category_is_never_overwritten() {
        let it = item("Intro course on papers", "tutorial", "arXiv").with_category(Category::News);
        assert_eq!(categorize(it).category, Some(Category::News));
    }

    #[test]
    fn empty_text_falls_through_to_default() {
        assert_eq!(classify("", None, ""), Category::News);
        assert_eq!(classify("", Some(""), "arxiv"), Category::Reading);
    }

    #[test]
    fn classification_is_deterministic() {
        let a = classify("Breaking: survey", Some("x"), "S");
        for _ in 0..10 {
            assert_eq!(classify("Breaking: survey", Some("x"), "S"), a);
        }
        assert_eq!(a, Category::Reading);
    }
}

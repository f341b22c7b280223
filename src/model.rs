// src/model.rs
//! Core records flowing through the ingest pipeline and out of the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed category set every stored item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    News,
    #[serde(alias = "course")]
    Courses,
    Reading,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::News, Category::Courses, Category::Reading];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::News => "news",
            Category::Courses => "courses",
            Category::Reading => "reading",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0:?}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Category::News),
            "courses" | "course" => Ok(Category::Courses),
            "reading" => Ok(Category::Reading),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = ParseCategoryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One item as produced by an adapter or a curated entry, before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(
        default,
        alias = "date",
        deserialize_with = "deserialize_loose_datetime"
    )]
    pub published_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            summary: None,
            source: source.into(),
            category: None,
            published_at: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// A persisted item, as returned by the store's read accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredItem {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub source: Option<String>,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub published_at: Option<DateTime<Utc>>,
    pub checked: bool,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
}

/// Listing filter for [`crate::store::Store::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemFilter {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl FromStr for Vote {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            other => anyhow::bail!("invalid vote type {other:?}, expected \"up\" or \"down\""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: i64,
    pub checked: i64,
    pub news: i64,
    pub courses: i64,
    pub reading: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SourceScore {
    pub source: String,
    pub net_votes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub count: i64,
    pub achieved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Journey {
    pub total_checked: i64,
    pub milestones: Vec<Milestone>,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_loose_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_loose_datetime<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_loose_datetime(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unparseable date {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("NEWS".parse::<Category>().unwrap(), Category::News);
        assert_eq!(" courses ".parse::<Category>().unwrap(), Category::Courses);
        assert!("blog".parse::<Category>().is_err());
    }

    #[test]
    fn manual_entry_accepts_plain_date_alias() {
        let json = r#"{
            "title": "Stanford CS229",
            "url": "https://cs229.stanford.edu/",
            "source": "Stanford University",
            "category": "courses",
            "date": "2024-01-01"
        }"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.category, Some(Category::Courses));
        assert_eq!(
            item.published_at.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn loose_datetime_rejects_garbage() {
        assert!(parse_loose_datetime("yesterday").is_none());
        assert!(parse_loose_datetime("").is_none());
        assert!(parse_loose_datetime("2024-03-05T10:00:00Z").is_some());
    }
}

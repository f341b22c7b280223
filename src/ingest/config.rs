// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::{SourceDescriptor, SourceKind};
use crate::model::{parse_loose_datetime, Category, ContentItem};

pub const ENV_SOURCES_PATH: &str = "AGGREGATOR_SOURCES_PATH";

/// Upstream sources plus hand-curated entries, reloaded on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default, alias = "manual_resources", alias = "manualResources")]
    pub manual: Vec<ContentItem>,
}

/// Load the catalogue from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<SourcesConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_sources(&content, ext.as_str())
        .with_context(|| format!("parsing sources from {}", path.display()))?;
    validate(cfg)
}

/// Load the catalogue using env var + fallbacks:
/// 1) $AGGREGATOR_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in seed
pub fn load_sources_default() -> Result<SourcesConfig> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(default_seed())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<SourcesConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => serde_json::from_str(s)
            .or_else(|_| toml::from_str(s))
            .map_err(|e| anyhow!("unsupported sources format: {e}")),
    }
}

fn validate(mut cfg: SourcesConfig) -> Result<SourcesConfig> {
    for (i, src) in cfg.sources.iter_mut().enumerate() {
        src.name = src.name.trim().to_string();
        src.address = src.address.trim().to_string();
        if src.name.is_empty() {
            bail!("source #{i} has an empty name");
        }
        if src.address.is_empty() {
            bail!("source {:?} has an empty address", src.name);
        }
    }
    Ok(cfg)
}

/// Built-in catalogue: AI research/lab/news feeds and a few classic courses.
pub fn default_seed() -> SourcesConfig {
    let feed = |name: &str, address: &str, category: Category| SourceDescriptor {
        name: name.to_string(),
        address: address.to_string(),
        kind: SourceKind::Feed,
        category: Some(category),
        selectors: None,
    };

    let sources = vec![
        feed("arXiv cs.AI", "https://export.arxiv.org/rss/cs.AI", Category::Reading),
        feed("arXiv cs.LG", "https://export.arxiv.org/rss/cs.LG", Category::Reading),
        feed("arXiv cs.CL", "https://export.arxiv.org/rss/cs.CL", Category::Reading),
        feed("arXiv cs.CV", "https://export.arxiv.org/rss/cs.CV", Category::Reading),
        feed("OpenAI Blog", "https://openai.com/blog/rss/", Category::News),
        feed("Google AI Blog", "https://ai.googleblog.com/feeds/posts/default", Category::News),
        feed("DeepMind Blog", "https://deepmind.com/blog/feed/basic/", Category::News),
        feed("Meta AI Blog", "https://ai.facebook.com/blog/feed/", Category::News),
        feed(
            "Microsoft Research Blog",
            "https://www.microsoft.com/en-us/research/feed/",
            Category::News,
        ),
        feed("Anthropic News", "https://www.anthropic.com/index/rss.xml", Category::News),
        feed("Hacker News (AI)", "https://hnrss.org/newest?q=AI+OR+ML", Category::News),
        feed(
            "Reddit r/MachineLearning",
            "https://www.reddit.com/r/MachineLearning/.rss",
            Category::News,
        ),
        feed(
            "TechCrunch AI",
            "https://techcrunch.com/category/artificial-intelligence/feed/",
            Category::News,
        ),
        feed("VentureBeat AI", "https://venturebeat.com/category/ai/feed/", Category::News),
        feed(
            "The Batch (deeplearning.ai)",
            "https://www.deeplearning.ai/the-batch/feed/",
            Category::News,
        ),
        feed("Towards Data Science", "https://towardsdatascience.com/feed", Category::News),
        feed("Hugging Face Blog", "https://huggingface.co/blog/feed.xml", Category::News),
        feed("Papers with Code", "https://paperswithcode.com/feeds/latest/", Category::Reading),
        feed("LangChain Blog", "https://blog.langchain.dev/feed/", Category::News),
        feed("Weights & Biases Blog", "https://wandb.ai/site/blog/feed/", Category::News),
    ];

    let course = |title: &str, url: &str, summary: &str, source: &str| ContentItem {
        title: title.to_string(),
        url: Some(url.to_string()),
        summary: Some(summary.to_string()),
        source: source.to_string(),
        category: Some(Category::Courses),
        published_at: parse_loose_datetime("2024-01-01"),
    };

    let manual = vec![
        course(
            "Stanford CS229: Machine Learning",
            "https://cs229.stanford.edu/",
            "Classic ML course by Andrew Ng",
            "Stanford University",
        ),
        course(
            "MIT 6.S191: Introduction to Deep Learning",
            "http://introtodeeplearning.com/",
            "Introductory deep learning course",
            "MIT",
        ),
        course(
            "Fast.ai: Practical Deep Learning",
            "https://course.fast.ai/",
            "Hands-on deep learning course",
            "fast.ai",
        ),
        course(
            "Deep Learning Specialization",
            "https://www.coursera.org/specializations/deep-learning",
            "Coursera specialization by Andrew Ng",
            "Coursera",
        ),
        course(
            "Hugging Face NLP Course",
            "https://huggingface.co/learn/nlp-course/",
            "Modern NLP course using Transformers",
            "Hugging Face",
        ),
    ];

    SourcesConfig { sources, manual }
}

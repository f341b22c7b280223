// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::ingest::fetch::{FetchOptions, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT};
use crate::store::DEFAULT_DB_PATH;

pub const ENV_CONFIG_PATH: &str = "AGGREGATOR_CONFIG_PATH";
pub const ENV_DB_PATH: &str = "AGGREGATOR_DB_PATH";
pub const ENV_CONCURRENCY: &str = "AGGREGATOR_CONCURRENCY";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "AGGREGATOR_FETCH_TIMEOUT_SECS";
pub const ENV_BIND: &str = "AGGREGATOR_BIND";

fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
fn default_user_agent() -> String {
    format!("resource-aggregator/{}", env!("CARGO_PKG_VERSION"))
}
fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Max adapter calls in flight during the fetch stage.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 0 disables the periodic scheduler.
    #[serde(default)]
    pub fetch_interval_secs: u64,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Overrides the sources catalogue lookup.
    #[serde(default)]
    pub sources_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
            fetch_interval_secs: 0,
            bind: default_bind(),
            sources_path: None,
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&data)?,
            _ => toml::from_str(&data)?,
        };
        Ok(cfg.sanitized())
    }

    /// Resolution: $AGGREGATOR_CONFIG_PATH → config/aggregator.toml →
    /// config/aggregator.json → defaults, then per-field env overrides.
    pub fn load() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(pb)?
        } else if Path::new("config/aggregator.toml").exists() {
            Self::load_from_file("config/aggregator.toml")?
        } else if Path::new("config/aggregator.json").exists() {
            Self::load_from_file("config/aggregator.json")?
        } else {
            Self::default()
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(p) = env::var(ENV_DB_PATH) {
            self.database_path = PathBuf::from(p);
        }
        if let Ok(raw) = env::var(ENV_CONCURRENCY) {
            self.concurrency = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_CONCURRENCY}={raw:?} is not a number"))?;
        }
        if let Ok(raw) = env::var(ENV_FETCH_TIMEOUT_SECS) {
            self.fetch_timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FETCH_TIMEOUT_SECS}={raw:?} is not a number"))?;
        }
        if let Ok(b) = env::var(ENV_BIND) {
            self.bind = b;
        }
        Ok(self.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.concurrency = self.concurrency.max(1);
        self.fetch_timeout_secs = self.fetch_timeout_secs.max(1);
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            concurrency: self.concurrency,
            timeout: self.fetch_timeout(),
        }
    }

    pub fn fetch_interval(&self) -> Option<Duration> {
        (self.fetch_interval_secs > 0).then(|| Duration::from_secs(self.fetch_interval_secs))
    }
}

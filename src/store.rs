// src/store.rs
//! SQLite-backed item store.
//!
//! `url` is the natural key: a partial unique index rejects a second row with
//! the same non-null url, and `INSERT OR IGNORE` turns that rejection into a
//! no-op. Rows without a url are never deduplicated. Bulk inserts run inside
//! one transaction and are serialized by an in-process write lock, so
//! overlapping pipeline runs cannot interleave their batches.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::model::{
    Category, ContentItem, ItemFilter, Journey, Milestone, SourceScore, Stats, StoredItem, Vote,
    VoteTally,
};

pub const DEFAULT_DB_PATH: &str = "data/resources.db";

/// Checked-item counts reported by [`Store::journey`].
pub const MILESTONES: [i64; 5] = [5, 10, 20, 50, 100];

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL CHECK (length(trim(title)) > 0),
        url TEXT,
        summary TEXT,
        source TEXT,
        category TEXT NOT NULL CHECK (category IN ('news', 'courses', 'reading')),
        published_at TEXT,
        checked INTEGER NOT NULL DEFAULT 0,
        upvotes INTEGER NOT NULL DEFAULT 0,
        downvotes INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_category ON items(category)",
    "CREATE INDEX IF NOT EXISTS idx_checked ON items(checked)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_url ON items(url) WHERE url IS NOT NULL",
];

const ITEM_COLUMNS: &str = "id, title, url, summary, source, category, published_at, \
                            checked, upvotes, downvotes, created_at";

/// Fixed-width UTC text so lexical order equals time order.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Open (creating if needed) the database file at `path` and apply the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };
        store.migrate().await?;
        tracing::info!(target: "store", path = %path.display(), "store opened");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Flush and close every pooled connection.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Insert all items in one transaction. Returns how many rows were created;
    /// duplicates (same non-null url) and rows the schema rejects are skipped.
    /// Any other failure rolls the whole batch back.
    pub async fn bulk_insert(&self, items: &[ContentItem]) -> Result<u64, StoreError> {
        let _writer = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let created_at = ts(Utc::now());
        let mut created = 0u64;

        for it in items {
            let res = sqlx::query(
                "INSERT OR IGNORE INTO items
                    (title, url, summary, source, category, published_at, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&it.title)
            .bind(it.url.as_deref())
            .bind(it.summary.as_deref())
            .bind(Some(it.source.as_str()).filter(|s| !s.is_empty()))
            .bind(it.category.unwrap_or(Category::Reading).as_str())
            .bind(it.published_at.map(ts))
            .bind(&created_at)
            .execute(&mut *tx)
            .await;

            match res {
                Ok(done) => created += done.rows_affected(),
                Err(sqlx::Error::Database(e))
                    if matches!(
                        e.kind(),
                        ErrorKind::UniqueViolation
                            | ErrorKind::NotNullViolation
                            | ErrorKind::CheckViolation
                    ) =>
                {
                    tracing::warn!(target: "store", url = ?it.url, error = %e, "row rejected");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        tracing::debug!(target: "store", attempted = items.len(), created, "bulk insert committed");
        Ok(created)
    }

    /// Items ordered by publication time (newest first, undated last), then id.
    pub async fn list(&self, filter: &ItemFilter) -> Result<Vec<StoredItem>, StoreError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ITEM_COLUMNS} FROM items WHERE 1 = 1"));
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(checked) = filter.checked {
            qb.push(" AND checked = ").push_bind(checked);
        }
        qb.push(" ORDER BY published_at IS NULL, published_at DESC, id DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = qb
            .build_query_as::<StoredItem>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<StoredItem>, StoreError> {
        let row = sqlx::query_as::<_, StoredItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn stats(&self) -> Result<Stats, StoreError> {
        let (total, checked, news, courses, reading): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*),
                        COALESCE(SUM(checked), 0),
                        COALESCE(SUM(category = 'news'), 0),
                        COALESCE(SUM(category = 'courses'), 0),
                        COALESCE(SUM(category = 'reading'), 0)
                 FROM items",
            )
            .fetch_one(&self.pool)
            .await?;
        Ok(Stats {
            total,
            checked,
            news,
            courses,
            reading,
        })
    }

    /// Sources ranked by net votes (upvotes - downvotes), ties by name.
    pub async fn top_sources(&self, limit: u32) -> Result<Vec<SourceScore>, StoreError> {
        let rows = sqlx::query_as::<_, SourceScore>(
            "SELECT COALESCE(NULLIF(source, ''), 'Unknown') AS source,
                    COALESCE(SUM(upvotes), 0) - COALESCE(SUM(downvotes), 0) AS net_votes
             FROM items
             GROUP BY COALESCE(NULLIF(source, ''), 'Unknown')
             ORDER BY net_votes DESC, source ASC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn journey(&self) -> Result<Journey, StoreError> {
        let total_checked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE checked = 1")
            .fetch_one(&self.pool)
            .await?;
        let milestones = MILESTONES
            .iter()
            .map(|&count| Milestone {
                count,
                achieved: total_checked >= count,
            })
            .collect();
        Ok(Journey {
            total_checked,
            milestones,
        })
    }

    /// Flip the checked flag. `None` when no item has this id.
    pub async fn toggle_checked(&self, id: i64) -> Result<Option<bool>, StoreError> {
        let _writer = self.write_lock.lock().await;
        let checked: Option<bool> =
            sqlx::query_scalar("UPDATE items SET checked = 1 - checked WHERE id = ? RETURNING checked")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(checked)
    }

    /// Count one vote. `None` when no item has this id.
    pub async fn vote(&self, id: i64, vote: Vote) -> Result<Option<VoteTally>, StoreError> {
        let column = match vote {
            Vote::Up => "upvotes",
            Vote::Down => "downvotes",
        };
        let _writer = self.write_lock.lock().await;
        let tally = sqlx::query_as::<_, VoteTally>(&format!(
            "UPDATE items SET {column} = {column} + 1 WHERE id = ? RETURNING upvotes, downvotes"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tally)
    }
}

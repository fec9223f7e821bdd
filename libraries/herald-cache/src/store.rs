/// Offline store implementation
use crate::error::{CacheError, Result};
use crate::types::{format_size, CacheRecord, CacheStats, CachedAudio, NewRecord};
use chrono::Utc;
use herald_core::ContentKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, warn};

/// Bumped whenever the `offline_audio` layout changes. A mismatch drops and
/// recreates the table: cached audio is re-downloadable, old rows are not
/// migrated.
const SCHEMA_VERSION: i64 = 2;

/// SQLite-backed offline audio store.
///
/// Cheap to clone; all clones share one connection pool. Writes replace whole
/// records atomically, so a `put` racing a `get` for the same key resolves
/// last-writer-wins with no partial record visible.
#[derive(Clone)]
pub struct OfflineStore {
    pool: SqlitePool,
}

impl OfflineStore {
    /// Open (or create) the store at `database_url`.
    ///
    /// # Errors
    /// Returns an error if the connection or schema setup fails. Construction
    /// failing is the one condition this crate reports loudly; everything
    /// after it degrades softly.
    pub async fn open(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Create an in-memory store (for tests and ephemeral sessions).
    pub async fn in_memory() -> Result<Self> {
        // A pool of one keeps every query on the same in-memory database.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        const MIGRATION: &str = include_str!("../migrations/20250801000001_create_offline_audio.sql");

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(pool)
            .await
            .map_err(|e| CacheError::Migration(e.to_string()))?;

        if version != 0 && version != SCHEMA_VERSION {
            warn!(
                from = version,
                to = SCHEMA_VERSION,
                "Cache schema changed, dropping offline audio table"
            );
            sqlx::query("DROP TABLE IF EXISTS offline_audio")
                .execute(pool)
                .await
                .map_err(|e| CacheError::Migration(e.to_string()))?;
        }

        for statement in MIGRATION.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| CacheError::Migration(e.to_string()))?;
        }

        sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .execute(pool)
            .await
            .map_err(|e| CacheError::Migration(e.to_string()))?;

        Ok(())
    }

    // ===== Public API (soft-failure surface) =====

    /// Store a record, overwriting any existing record for the same id.
    ///
    /// Returns `false` on storage failure (quota, corruption); the failure is
    /// logged, never propagated.
    pub async fn put(&self, record: NewRecord) -> bool {
        match self.try_put(record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Cache put failed");
                false
            }
        }
    }

    /// Look up a record with its payload materialized.
    ///
    /// `Some(CachedAudio::Blob)` carries a freshly allocated, caller-owned
    /// copy of the audio bytes. `Some(CachedAudio::Url)` is returned for
    /// URL-only reference records. `None` means absent or storage failure.
    pub async fn get(&self, story_id: &str) -> Option<CachedAudio> {
        match self.try_get(story_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(story_id = %story_id, error = %e, "Cache get failed");
                None
            }
        }
    }

    /// Whether a non-empty audio payload is stored for `story_id`.
    ///
    /// URL-only records count as not cached.
    pub async fn contains(&self, story_id: &str) -> bool {
        match self.try_contains(story_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(story_id = %story_id, error = %e, "Cache lookup failed");
                false
            }
        }
    }

    /// Remove a record. Idempotent: removing an absent key succeeds.
    pub async fn remove(&self, story_id: &str) -> bool {
        match self.try_remove(story_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(story_id = %story_id, error = %e, "Cache remove failed");
                false
            }
        }
    }

    /// List every record, metadata only. Payloads are never loaded here.
    pub async fn list(&self) -> Vec<CacheRecord> {
        match self.try_list().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Cache listing failed");
                Vec::new()
            }
        }
    }

    /// List all cached story ids.
    pub async fn list_ids(&self) -> Vec<String> {
        match self.try_list_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Cache id listing failed");
                Vec::new()
            }
        }
    }

    /// Aggregate statistics, computed from the metadata listing.
    pub async fn stats(&self) -> CacheStats {
        let records = self.list().await;
        let total_size_bytes: u64 = records.iter().map(|r| r.size_bytes).sum();

        CacheStats {
            total_items: records.len(),
            offline_ready_count: records.iter().filter(|r| r.offline_ready).count(),
            total_size_bytes,
            formatted_size: format_size(total_size_bytes),
        }
    }

    /// Remove every record.
    pub async fn clear(&self) -> bool {
        match self.try_clear().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Cache clear failed");
                false
            }
        }
    }

    // ===== Internals =====

    async fn try_put(&self, record: NewRecord) -> Result<()> {
        let size = record.audio.as_ref().map_or(0, Vec::len) as i64;

        sqlx::query(
            "INSERT OR REPLACE INTO offline_audio
                 (story_id, title, source, kind, duration_secs, audio_url, audio_blob, size_bytes, cached_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.story_id)
        .bind(&record.title)
        .bind(&record.source)
        .bind(record.kind.as_str())
        .bind(record.duration_secs)
        .bind(&record.audio_url)
        .bind(&record.audio)
        .bind(size)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        debug!(story_id = %record.story_id, size, "Cached audio record");
        Ok(())
    }

    async fn try_get(&self, story_id: &str) -> Result<Option<CachedAudio>> {
        let row = sqlx::query(
            "SELECT story_id, title, source, kind, duration_secs, audio_url, audio_blob, size_bytes, cached_at
             FROM offline_audio WHERE story_id = ?",
        )
        .bind(story_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let blob: Option<Vec<u8>> = row.get("audio_blob");
        let url: Option<String> = row.get("audio_url");
        let mut record = Self::record_from_row(&row)?;
        record.offline_ready = blob.as_ref().is_some_and(|b| !b.is_empty());

        match blob {
            Some(bytes) if !bytes.is_empty() => Ok(Some(CachedAudio::Blob { record, bytes })),
            _ => match url {
                Some(url) => Ok(Some(CachedAudio::Url { record, url })),
                None => Ok(None),
            },
        }
    }

    async fn try_contains(&self, story_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM offline_audio
             WHERE story_id = ? AND audio_blob IS NOT NULL AND length(audio_blob) > 0",
        )
        .bind(story_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn try_remove(&self, story_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM offline_audio WHERE story_id = ?")
            .bind(story_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn try_list(&self) -> Result<Vec<CacheRecord>> {
        let rows = sqlx::query(
            "SELECT story_id, title, source, kind, duration_secs, audio_url, size_bytes, cached_at,
                    (audio_blob IS NOT NULL AND length(audio_blob) > 0) AS offline_ready
             FROM offline_audio ORDER BY cached_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let mut record = Self::record_from_row(row)?;
                record.offline_ready = row.get::<i64, _>("offline_ready") != 0;
                Ok(record)
            })
            .collect()
    }

    async fn try_list_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar("SELECT story_id FROM offline_audio ORDER BY cached_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn try_clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM offline_audio")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CacheRecord> {
        Ok(CacheRecord {
            story_id: row.get("story_id"),
            title: row.get("title"),
            source: row.get("source"),
            kind: ContentKind::parse(&row.get::<String, _>("kind")),
            duration_secs: row.get("duration_secs"),
            audio_url: row.get("audio_url"),
            size_bytes: row.get::<i64, _>("size_bytes") as u64,
            // Filled in by callers that select the readiness expression; the
            // single-record path derives it from the materialized payload.
            offline_ready: false,
            cached_at: chrono::DateTime::from_timestamp(row.get::<i64, _>("cached_at"), 0)
                .unwrap_or_else(Utc::now),
        })
    }
}

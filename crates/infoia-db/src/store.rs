//! Persisted `SeenIndex` and digest history.
//!
//! All writes go through [`DigestStore::commit_run`], which stores the digest
//! and every identity it emitted in one transaction while holding the store's
//! write lock. Readers never take the lock.

use chrono::{DateTime, NaiveDate, Utc};
use infoia_core::{Digest, ItemId, SeenIndex};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::PersistenceError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
struct SeenRow {
    identity: String,
    first_seen_at: DateTime<Utc>,
}

/// Summary of one stored digest, without its document.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DigestRow {
    pub run_id: String,
    pub edition_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub item_count: i64,
    pub degraded_blocks: i64,
    pub source_failures: i64,
}

/// Size of the seen index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenStats {
    pub total: i64,
    /// Identities first seen at or after the `since` cut-off.
    pub recent: i64,
}

/// What a successful commit wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub seen_inserted: u64,
    pub item_count: usize,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Single-writer access to the digest database.
pub struct DigestStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl DigestStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load every persisted identity with its first-seen timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlx`] if the query fails.
    pub async fn load_seen_index(&self) -> Result<SeenIndex, PersistenceError> {
        let rows = sqlx::query_as::<_, SeenRow>(
            "SELECT identity, first_seen_at FROM seen_items ORDER BY identity",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (ItemId::new(row.identity), row.first_seen_at))
            .collect())
    }

    /// Atomically persist `digest` and the identities it emitted.
    ///
    /// Each emitted identity is stored with its first-seen time from `seen`
    /// (the digest's generation time when absent). Identities already stored
    /// keep their original timestamp. Either the digest row and all new
    /// identities are written, or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialization`] if the digest cannot be
    /// encoded, or [`PersistenceError::Sqlx`] if any statement fails, in
    /// which case the transaction is rolled back.
    pub async fn commit_run(
        &self,
        digest: &Digest,
        seen: &SeenIndex,
    ) -> Result<CommitSummary, PersistenceError> {
        let document = serde_json::to_string(digest)?;
        let item_count = digest.item_count();
        let degraded_blocks = digest.blocks.iter().filter(|b| b.is_degraded()).count();

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut seen_inserted = 0;
        for block in &digest.blocks {
            for entry in &block.entries {
                let first_seen = seen
                    .first_seen(&entry.item.id)
                    .unwrap_or(digest.generated_at);
                let result = sqlx::query(
                    "INSERT OR IGNORE INTO seen_items (identity, source_id, first_seen_at) \
                     VALUES (?, ?, ?)",
                )
                .bind(entry.item.id.as_str())
                .bind(&entry.item.source_id)
                .bind(first_seen)
                .execute(&mut *tx)
                .await?;
                seen_inserted += result.rows_affected();
            }
        }

        sqlx::query(
            "INSERT INTO digests \
                 (run_id, edition_date, generated_at, item_count, degraded_blocks, \
                  source_failures, document) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(digest.run_id.to_string())
        .bind(digest.edition)
        .bind(digest.generated_at)
        .bind(to_i64(item_count))
        .bind(to_i64(degraded_blocks))
        .bind(to_i64(digest.source_failures.len()))
        .bind(document)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            run_id = %digest.run_id,
            item_count,
            seen_inserted,
            "digest committed"
        );

        Ok(CommitSummary {
            seen_inserted,
            item_count,
        })
    }

    /// Most recent digests first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlx`] if the query fails.
    pub async fn list_digests(&self, limit: i64) -> Result<Vec<DigestRow>, PersistenceError> {
        let rows = sqlx::query_as::<_, DigestRow>(
            "SELECT run_id, edition_date, generated_at, item_count, degraded_blocks, \
                    source_failures \
             FROM digests \
             ORDER BY generated_at DESC, run_id DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The latest digest for `edition`, or the latest overall when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::DigestNotFound`] if there is none,
    /// [`PersistenceError::Serialization`] if the stored document cannot be
    /// decoded, or [`PersistenceError::Sqlx`] if the query fails.
    pub async fn latest_digest(
        &self,
        edition: Option<NaiveDate>,
    ) -> Result<Digest, PersistenceError> {
        let document: Option<String> = match edition {
            Some(date) => {
                sqlx::query_scalar(
                    "SELECT document FROM digests \
                     WHERE edition_date = ? \
                     ORDER BY generated_at DESC LIMIT 1",
                )
                .bind(date)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "SELECT document FROM digests ORDER BY generated_at DESC LIMIT 1",
                )
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let document = document.ok_or_else(|| {
            PersistenceError::DigestNotFound(
                edition.map_or_else(|| "any date".to_string(), |d| d.to_string()),
            )
        })?;
        Ok(serde_json::from_str(&document)?)
    }

    /// Count all identities and those first seen at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlx`] if the query fails.
    pub async fn seen_stats(&self, since: DateTime<Utc>) -> Result<SeenStats, PersistenceError> {
        let (total, recent): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN first_seen_at >= ? THEN 1 ELSE 0 END), 0) \
             FROM seen_items",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(SeenStats { total, recent })
    }

    /// Delete identities first seen before `cutoff`. Returns how many were
    /// removed. Pruned items may be emitted again if a source still lists them.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Sqlx`] if the delete fails.
    pub async fn prune_seen_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM seen_items WHERE first_seen_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        tracing::info!(removed = result.rows_affected(), %cutoff, "pruned seen index");
        Ok(result.rows_affected())
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

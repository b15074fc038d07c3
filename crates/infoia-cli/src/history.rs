//! Read-side commands over the digest database, plus `prune`.

use chrono::{Duration, NaiveDate, Utc};
use infoia_core::AppConfig;
use infoia_db::{DigestRow, DigestStore};

use crate::digest::render_digest;

pub(crate) async fn open_store(config: &AppConfig) -> anyhow::Result<DigestStore> {
    let pool = infoia_db::connect_from_app_config(config).await?;
    Ok(DigestStore::new(pool))
}

pub(crate) async fn print_history(store: &DigestStore, limit: i64) -> anyhow::Result<()> {
    let rows = store.list_digests(limit.max(1)).await?;
    if rows.is_empty() {
        println!("no digests yet");
        return Ok(());
    }
    for row in &rows {
        println!("{}", format_history_row(row));
    }
    Ok(())
}

pub(crate) fn format_history_row(row: &DigestRow) -> String {
    format!(
        "{}  {}  {:>3} items  {} degraded  {} failed sources  {}",
        row.edition_date,
        row.generated_at.format("%H:%M:%SZ"),
        row.item_count,
        row.degraded_blocks,
        row.source_failures,
        row.run_id
    )
}

/// Print the latest digest for `date`, or the latest overall.
///
/// # Errors
///
/// Returns an error if no digest matches or the database is unavailable.
pub(crate) async fn show_digest(
    store: &DigestStore,
    date: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let digest = store.latest_digest(date).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&digest)?);
    } else {
        print!("{}", render_digest(&digest));
    }
    Ok(())
}

pub(crate) async fn print_stats(store: &DigestStore) -> anyhow::Result<()> {
    let stats = store.seen_stats(Utc::now() - Duration::hours(24)).await?;
    println!("seen items: {}", stats.total);
    println!("first seen in the last 24h: {}", stats.recent);
    if let Some(last) = store.list_digests(1).await?.first() {
        println!("last digest: {}", format_history_row(last));
    }
    Ok(())
}

/// Delete seen-index entries first seen more than `days` days ago.
///
/// # Errors
///
/// Returns an error if `days` is zero or the delete fails.
pub(crate) async fn prune(store: &DigestStore, days: u32) -> anyhow::Result<()> {
    if days == 0 {
        anyhow::bail!("--days must be at least 1");
    }
    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let removed = store.prune_seen_before(cutoff).await?;
    println!("removed {removed} seen items first seen before {}", cutoff.date_naive());
    Ok(())
}

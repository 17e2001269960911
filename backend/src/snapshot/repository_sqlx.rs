use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::StoreError;
use crate::snapshot::model::Snapshot;
use crate::snapshot::repository::SnapshotRepository;

const SNAPSHOT_COLUMNS: &str = "
  pair_id, base_symbol, base_address, price, price_usd,
  buys_5m, sells_5m, volume_5m, volume_1h,
  price_change_5m, price_change_1h, liquidity_usd, market_cap, timestamp_ms";

/// SQLx-backed implementation of SnapshotRepository.
/// Responsible only for persistence and row mapping.
#[derive(Clone)]
pub struct SqlxSnapshotRepository {
    pool: SqlitePool,
}

impl SqlxSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for SqlxSnapshotRepository {
    async fn insert(&self, s: &Snapshot) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO snapshots (
  pair_id, base_symbol, base_address, price, price_usd,
  buys_5m, sells_5m, volume_5m, volume_1h,
  price_change_5m, price_change_1h, liquidity_usd, market_cap, timestamp_ms
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(&s.pair_id)
        .bind(&s.base_symbol)
        .bind(&s.base_address)
        .bind(&s.price)
        .bind(&s.price_usd)
        .bind(u64_to_i64(s.buys_5m)?)
        .bind(u64_to_i64(s.sells_5m)?)
        .bind(s.volume_5m)
        .bind(s.volume_1h)
        .bind(s.price_change_5m)
        .bind(s.price_change_1h)
        .bind(s.liquidity_usd)
        .bind(s.market_cap)
        .bind(u64_to_i64(s.timestamp_ms)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn most_recent_before(
        &self,
        pair_id: &str,
        cutoff_ms: u64,
    ) -> Result<Option<Snapshot>, StoreError> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots
             WHERE pair_id = ? AND timestamp_ms < ?
             ORDER BY timestamp_ms DESC, id DESC
             LIMIT 1;"
        );

        let row = sqlx::query(&sql)
            .bind(pair_id)
            .bind(u64_to_i64(cutoff_ms)?)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_snapshot(&r)?)),
            None => Ok(None),
        }
    }

    async fn all_since(&self, pair_id: &str, cutoff_ms: u64) -> Result<Vec<Snapshot>, StoreError> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots
             WHERE pair_id = ? AND timestamp_ms > ?
             ORDER BY timestamp_ms ASC, id ASC;"
        );

        let rows = sqlx::query(&sql)
            .bind(pair_id)
            .bind(u64_to_i64(cutoff_ms)?)
            .fetch_all(&self.pool)
            .await?;

        // A window with a hole in it would skew every step-wise rate, so an
        // unreadable row fails the whole window instead of being skipped.
        rows.iter().map(row_to_snapshot).collect()
    }

    async fn latest_per_pair_since(&self, cutoff_ms: u64) -> Result<Vec<Snapshot>, StoreError> {
        // A pair qualifies iff its overall newest row is past the cutoff.
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots s
             WHERE s.timestamp_ms > ?
               AND NOT EXISTS (
                 SELECT 1 FROM snapshots n
                 WHERE n.pair_id = s.pair_id
                   AND (n.timestamp_ms > s.timestamp_ms
                        OR (n.timestamp_ms = s.timestamp_ms AND n.id > s.id))
               )
             ORDER BY s.pair_id ASC;"
        );

        let rows = sqlx::query(&sql)
            .bind(u64_to_i64(cutoff_ms)?)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_snapshot(&r) {
                Ok(s) => out.push(s),
                Err(e) => {
                    // poison-row resilience: skip the pair, keep the pass alive
                    tracing::warn!(error = %e, "skipping malformed snapshot row");
                }
            }
        }

        Ok(out)
    }
}

/* =========================
Row mapping + conversions
========================= */

fn row_to_snapshot(r: &SqliteRow) -> Result<Snapshot, StoreError> {
    Ok(Snapshot {
        pair_id: r.try_get("pair_id")?,
        base_symbol: r.try_get("base_symbol")?,
        base_address: r.try_get("base_address")?,
        price: r.try_get("price")?,
        price_usd: r.try_get("price_usd")?,
        buys_5m: i64_to_u64("buys_5m", r.try_get("buys_5m")?)?,
        sells_5m: i64_to_u64("sells_5m", r.try_get("sells_5m")?)?,
        volume_5m: r.try_get("volume_5m")?,
        volume_1h: r.try_get("volume_1h")?,
        price_change_5m: r.try_get("price_change_5m")?,
        price_change_1h: r.try_get("price_change_1h")?,
        liquidity_usd: r.try_get("liquidity_usd")?,
        market_cap: r.try_get("market_cap")?,
        timestamp_ms: i64_to_u64("timestamp_ms", r.try_get("timestamp_ms")?)?,
        feed: None,
    })
}

fn i64_to_u64(column: &str, v: i64) -> Result<u64, StoreError> {
    if v < 0 {
        return Err(StoreError::InvalidRow(format!("negative {column}: {v}")));
    }
    Ok(v as u64)
}

fn u64_to_i64(v: u64) -> Result<i64, StoreError> {
    if v > i64::MAX as u64 {
        return Err(StoreError::OutOfRange(format!("u64 too large for i64: {v}")));
    }
    Ok(v as i64)
}

use sqlx::SqlitePool;

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    // Snapshots: append-only time series, one row per accepted observation.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS snapshots (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  pair_id TEXT NOT NULL,
  base_symbol TEXT NOT NULL,
  base_address TEXT NOT NULL,
  price TEXT NOT NULL,
  price_usd TEXT NOT NULL,
  buys_5m INTEGER NOT NULL,
  sells_5m INTEGER NOT NULL,
  volume_5m REAL NOT NULL,
  volume_1h REAL NOT NULL,
  price_change_5m REAL NOT NULL,
  price_change_1h REAL NOT NULL,
  liquidity_usd REAL NOT NULL,
  market_cap REAL NOT NULL,
  timestamp_ms INTEGER NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_snapshots_pair_ts ON snapshots(pair_id, timestamp_ms);"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_snapshots_ts ON snapshots(timestamp_ms);"#)
        .execute(pool)
        .await?;

    Ok(())
}

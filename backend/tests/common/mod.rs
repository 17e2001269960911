#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use corelib::models::{Liquidity, PairData, TokenInfo, TxnCount, TxnWindows, WindowedValues};
use parking_lot::Mutex;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use pairwatch::error::StoreError;
use pairwatch::notify::{Notifier, NotifyError};
use pairwatch::snapshot::{Snapshot, SnapshotRepository};

/// Isolated, uniquely named in-memory SQLite database with the schema applied.
pub async fn setup_db() -> SqlitePool {
    let db_name = Uuid::new_v4().to_string();
    let conn_str = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&conn_str)
        .await
        .unwrap();

    pairwatch::db::schema::migrate(&pool).await.unwrap();

    pool
}

pub fn snapshot(pair_id: &str, timestamp_ms: u64) -> Snapshot {
    Snapshot {
        pair_id: pair_id.into(),
        base_symbol: "TKN".into(),
        base_address: format!("{pair_id}-mint"),
        price: "0.001".into(),
        price_usd: "1.0".into(),
        buys_5m: 5,
        sells_5m: 5,
        volume_5m: 10.0,
        volume_1h: 100.0,
        price_change_5m: 0.0,
        price_change_1h: 0.0,
        liquidity_usd: 1000.0,
        market_cap: 10_000.0,
        timestamp_ms,
        feed: None,
    }
}

pub fn pair(chain_id: &str, pair_address: &str, price_usd: &str) -> PairData {
    PairData {
        chain_id: chain_id.into(),
        dex_id: "raydium".into(),
        pair_address: pair_address.into(),
        base_token: TokenInfo {
            name: "Token".into(),
            symbol: "TKN".into(),
            address: format!("{pair_address}-mint"),
        },
        price: "0.001".into(),
        price_usd: price_usd.into(),
        txns: TxnWindows {
            m5: TxnCount { buys: 5, sells: 5 },
            h1: TxnCount { buys: 50, sells: 50 },
            h6: TxnCount::default(),
            h24: TxnCount::default(),
        },
        volume: WindowedValues {
            m5: 10.0,
            h1: 100.0,
            h6: 600.0,
            h24: 2400.0,
        },
        price_change: WindowedValues {
            m5: 0.0,
            h1: 0.0,
            h6: 0.0,
            h24: 0.0,
        },
        liquidity: Some(Liquidity {
            usd: 1000.0,
            base: 0.0,
            quote: 0.0,
        }),
        market_cap: 10_000.0,
        pair_created_at: None,
    }
}

/// In-memory store with per-pair failure injection.
#[derive(Default)]
pub struct MockRepository {
    rows: Mutex<Vec<Snapshot>>,
    fail_insert: Mutex<HashSet<String>>,
    fail_window: Mutex<HashSet<String>>,
    fail_scan: Mutex<bool>,
}

impl MockRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_insert_for(&self, pair_id: &str) {
        self.fail_insert.lock().insert(pair_id.to_string());
    }

    pub fn fail_window_for(&self, pair_id: &str) {
        self.fail_window.lock().insert(pair_id.to_string());
    }

    pub fn fail_scan(&self) {
        *self.fail_scan.lock() = true;
    }

    pub fn rows(&self) -> Vec<Snapshot> {
        self.rows.lock().clone()
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::InvalidRow(format!("injected {what} failure"))
}

#[async_trait]
impl SnapshotRepository for MockRepository {
    async fn insert(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.fail_insert.lock().contains(&snapshot.pair_id) {
            return Err(injected("insert"));
        }
        let mut stored = snapshot.clone();
        stored.feed = None;
        self.rows.lock().push(stored);
        Ok(())
    }

    async fn most_recent_before(
        &self,
        pair_id: &str,
        cutoff_ms: u64,
    ) -> Result<Option<Snapshot>, StoreError> {
        let rows = self.rows.lock();
        // later rows win ties, matching insertion order
        Ok(rows
            .iter()
            .filter(|s| s.pair_id == pair_id && s.timestamp_ms < cutoff_ms)
            .fold(None::<&Snapshot>, |best, s| match best {
                Some(b) if b.timestamp_ms > s.timestamp_ms => Some(b),
                _ => Some(s),
            })
            .cloned())
    }

    async fn all_since(&self, pair_id: &str, cutoff_ms: u64) -> Result<Vec<Snapshot>, StoreError> {
        if self.fail_window.lock().contains(pair_id) {
            return Err(injected("window"));
        }
        let mut out: Vec<Snapshot> = self
            .rows
            .lock()
            .iter()
            .filter(|s| s.pair_id == pair_id && s.timestamp_ms > cutoff_ms)
            .cloned()
            .collect();
        out.sort_by_key(|s| s.timestamp_ms);
        Ok(out)
    }

    async fn latest_per_pair_since(&self, cutoff_ms: u64) -> Result<Vec<Snapshot>, StoreError> {
        if *self.fail_scan.lock() {
            return Err(injected("scan"));
        }
        let rows = self.rows.lock();
        let mut latest: Vec<Snapshot> = Vec::new();
        for s in rows.iter() {
            match latest.iter_mut().find(|l| l.pair_id == s.pair_id) {
                Some(l) if s.timestamp_ms >= l.timestamp_ms => *l = s.clone(),
                Some(_) => {}
                None => latest.push(s.clone()),
            }
        }
        latest.retain(|s| s.timestamp_ms > cutoff_ms);
        latest.sort_by(|a, b| a.pair_id.cmp(&b.pair_id));
        Ok(latest)
    }
}

/// Records every delivered message; optionally rejects messages that
/// mention one of the configured pair ids.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    reject_containing: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject_reports_for(&self, pair_id: &str) {
        self.reject_containing.lock().push(pair_id.to_string());
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let rejected = self
            .reject_containing
            .lock()
            .iter()
            .any(|p| message.contains(&format!("Pair Address: {p}\n")));
        if rejected {
            return Err(NotifyError::Rejected("chat not found".into()));
        }
        self.sent.lock().push(message.to_string());
        Ok(())
    }
}

use async_trait::async_trait;

use crate::error::StoreError;
use crate::snapshot::model::Snapshot;

/// Append-only time-series store of pair snapshots.
///
/// Snapshots of one pair are ordered by `timestamp_ms`, ties broken by
/// insertion order. All reads are side-effect free.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Appends a row. No deduplication happens here.
    async fn insert(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Latest snapshot of `pair_id` strictly older than `cutoff_ms`.
    async fn most_recent_before(
        &self,
        pair_id: &str,
        cutoff_ms: u64,
    ) -> Result<Option<Snapshot>, StoreError>;

    /// Every snapshot of `pair_id` strictly newer than `cutoff_ms`, ascending.
    async fn all_since(&self, pair_id: &str, cutoff_ms: u64) -> Result<Vec<Snapshot>, StoreError>;

    /// The most recent snapshot of every pair that has at least one snapshot
    /// newer than `cutoff_ms`; one row per pair.
    async fn latest_per_pair_since(&self, cutoff_ms: u64) -> Result<Vec<Snapshot>, StoreError>;
}

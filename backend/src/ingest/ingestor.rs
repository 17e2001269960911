//! Feed ingestion path.
//!
//! Turns feed batches into stored snapshots:
//! - drops pairs of other chains, malformed entries and in-batch repeats;
//! - drops pairs whose price did not move since the last accepted write;
//! - stamps and appends the rest, then records them in the dedup cache.
//!
//! A failed write is logged and counted; the rest of the batch proceeds.
//! Optionally every chain-filtered, well-formed sighting runs through the
//! instant detector bank, whether or not the dedup cache let it be stored.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use adapters::dexscreener::FeedBatch;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, info, instrument, warn};

use crate::ingest::dedup::DedupCache;
use crate::logger::warn_if_slow;
use crate::metrics::Counters;
use crate::notify::Notifier;
use crate::report::{Freshness, ReportContext, build_report};
use crate::signals::detect_fresh_signals;
use crate::snapshot::{Snapshot, SnapshotRepository};
use crate::time::now_ms;

/// Outcome of one ingested batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Entries in the batch, malformed ones included.
    pub received: usize,
    pub wrong_chain: usize,
    pub malformed: usize,
    pub duplicate_in_batch: usize,
    pub dedup_skipped: usize,
    pub inserted: usize,
    pub write_failed: usize,
    pub fresh_reports: usize,
}

/// Instant-bank evaluation on every live sighting of a pair.
pub struct FreshReporter {
    pub notifier: Arc<dyn Notifier>,
    pub report_ctx: ReportContext,
    pub lookback_ms: u64,
}

pub struct Ingestor {
    repo: Arc<dyn SnapshotRepository>,
    cache: Arc<DedupCache>,
    chain_id: String,
    /// Highest timestamp handed out so far; stamps never go backwards.
    last_stamp_ms: AtomicU64,
    fresh: Option<FreshReporter>,
    counters: Counters,
}

impl Ingestor {
    pub fn new(
        repo: Arc<dyn SnapshotRepository>,
        cache: Arc<DedupCache>,
        chain_id: impl Into<String>,
        counters: Counters,
    ) -> Self {
        Self {
            repo,
            cache,
            chain_id: chain_id.into(),
            last_stamp_ms: AtomicU64::new(0),
            fresh: None,
            counters,
        }
    }

    /// Enables the instant detector bank on live sightings.
    pub fn with_fresh_reporter(mut self, fresh: FreshReporter) -> Self {
        self.fresh = Some(fresh);
        self
    }

    pub async fn ingest_batch(&self, batch: FeedBatch) -> IngestStats {
        self.ingest_batch_at(batch, now_ms()).await
    }

    /// Ingests `batch` as observed at `now_ms`.
    #[instrument(skip(self, batch), target = "ingest", fields(pairs = batch.pairs.len()))]
    pub async fn ingest_batch_at(&self, batch: FeedBatch, now_ms: u64) -> IngestStats {
        let mut stats = IngestStats {
            received: batch.pairs.len() + batch.malformed,
            malformed: batch.malformed,
            ..IngestStats::default()
        };
        let mut seen: HashSet<&str> = HashSet::with_capacity(batch.pairs.len());

        for pair in &batch.pairs {
            if pair.chain_id != self.chain_id {
                stats.wrong_chain += 1;
                continue;
            }

            if !seen.insert(pair.pair_address.as_str()) {
                stats.duplicate_in_batch += 1;
                continue;
            }

            let candidate = Snapshot::from_feed(pair, now_ms);
            if candidate.price_usd_value().is_none() {
                debug!(pair_id = %candidate.pair_id, price_usd = %candidate.price_usd, "unparseable usd price");
                stats.malformed += 1;
                continue;
            }

            if self.cache.should_skip(&candidate) {
                stats.dedup_skipped += 1;
                // not stored, but still a live sighting for the instant bank
                if self.report_fresh(&candidate).await {
                    stats.fresh_reports += 1;
                }
                continue;
            }

            let snapshot = candidate.stamped(self.next_stamp(now_ms));
            match self.repo.insert(&snapshot).await {
                Ok(()) => {
                    stats.inserted += 1;
                    self.cache.accept(snapshot.clone());

                    if self.report_fresh(&snapshot).await {
                        stats.fresh_reports += 1;
                    }
                }
                Err(e) => {
                    stats.write_failed += 1;
                    warn!(pair_id = %snapshot.pair_id, error = %e, "snapshot write failed");
                }
            }
        }

        self.record(&stats);
        debug!(?stats, "feed batch ingested");

        stats
    }

    /// Drains `rx` until every feed sender is gone.
    pub async fn run(self: Arc<Self>, mut rx: Receiver<FeedBatch>) {
        info!(chain_id = %self.chain_id, "ingestion loop started");

        while let Some(batch) = rx.recv().await {
            if batch.is_empty() {
                continue;
            }
            self.ingest_batch(batch).await;
        }

        info!("ingestion loop stopped; all feeds closed");
    }

    fn next_stamp(&self, now_ms: u64) -> u64 {
        let prev = self.last_stamp_ms.fetch_max(now_ms, Ordering::AcqRel);
        prev.max(now_ms)
    }

    /// Returns true when a report was delivered.
    async fn report_fresh(&self, snapshot: &Snapshot) -> bool {
        let Some(fresh) = &self.fresh else {
            return false;
        };

        let signals = match detect_fresh_signals(
            self.repo.as_ref(),
            snapshot,
            snapshot.timestamp_ms,
            fresh.lookback_ms,
        )
        .await
        {
            Ok(s) => s,
            Err(e) => {
                warn!(pair_id = %snapshot.pair_id, error = %e, "fresh detection failed");
                return false;
            }
        };

        if signals.is_empty() {
            return false;
        }

        info!(
            pair_id = %snapshot.pair_id,
            signals = ?signals.iter().map(|s| s.label()).collect::<Vec<_>>(),
            "fresh signals detected"
        );

        let report = build_report(
            snapshot,
            &signals,
            Freshness::Fresh,
            snapshot.timestamp_ms,
            &fresh.report_ctx,
        );

        match warn_if_slow("notify_fresh", Duration::from_secs(2), fresh.notifier.send(&report)).await {
            Ok(()) => {
                Counters::bump(&self.counters.reports_sent, 1);
                true
            }
            Err(e) => {
                Counters::bump(&self.counters.reports_failed, 1);
                warn!(pair_id = %snapshot.pair_id, error = %e, "fresh report delivery failed");
                false
            }
        }
    }

    fn record(&self, stats: &IngestStats) {
        let c = &self.counters;
        Counters::bump(&c.ingest_batches, 1);
        Counters::bump(&c.ingest_inserted, stats.inserted as u64);
        Counters::bump(&c.ingest_write_failed, stats.write_failed as u64);
        Counters::bump(&c.ingest_skip_chain, stats.wrong_chain as u64);
        Counters::bump(&c.ingest_skip_malformed, stats.malformed as u64);
        Counters::bump(&c.ingest_skip_duplicate, stats.duplicate_in_batch as u64);
        Counters::bump(&c.ingest_skip_unchanged, stats.dedup_skipped as u64);
    }
}

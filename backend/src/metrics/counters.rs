use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime counters for operational visibility.
///
/// Cloning shares the same underlying counters.
#[derive(Clone, Default)]
pub struct Counters {
    // ingestion
    pub ingest_batches: Arc<AtomicU64>,
    pub ingest_inserted: Arc<AtomicU64>,
    pub ingest_write_failed: Arc<AtomicU64>,

    // skip reasons
    pub ingest_skip_chain: Arc<AtomicU64>,
    pub ingest_skip_malformed: Arc<AtomicU64>,
    pub ingest_skip_duplicate: Arc<AtomicU64>,
    pub ingest_skip_unchanged: Arc<AtomicU64>,

    // detection + delivery
    pub batch_passes: Arc<AtomicU64>,
    pub batch_pair_failed: Arc<AtomicU64>,
    pub reports_sent: Arc<AtomicU64>,
    pub reports_failed: Arc<AtomicU64>,
}

impl Counters {
    pub fn bump(counter: &AtomicU64, by: u64) {
        if by > 0 {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

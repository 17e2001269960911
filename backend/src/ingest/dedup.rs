use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, instrument};

use crate::snapshot::Snapshot;

/// Last-accepted snapshot per pair, used to drop writes that carry no price
/// change.
///
/// Guarantees:
/// - Memory usage is bounded by `capacity` pairs.
/// - On overflow the pair admitted first is evicted. Re-accepting a cached
///   pair replaces its entry but does not move it in the admission order.
/// - Only `price` and `price_usd` are compared; other drift is ignored.
pub struct DedupCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Snapshot>,
    admission: VecDeque<String>,
}

impl DedupCache {
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `candidate` has the same `price` and `price_usd` as the
    /// cached entry for its pair. Pairs with no entry are never skipped.
    pub fn should_skip(&self, candidate: &Snapshot) -> bool {
        let inner = self.inner.lock();
        match inner.entries.get(&candidate.pair_id) {
            Some(last) => last.price == candidate.price && last.price_usd == candidate.price_usd,
            None => false,
        }
    }

    /// Records `snapshot` as the last accepted one for its pair.
    ///
    /// Call only after the snapshot has been stored.
    #[instrument(skip(self, snapshot), target = "cache", fields(pair_id = %snapshot.pair_id), level = "trace")]
    pub fn accept(&self, snapshot: Snapshot) {
        let mut inner = self.inner.lock();
        let Inner {
            entries,
            admission,
        } = &mut *inner;

        let pair_id = snapshot.pair_id.clone();
        if entries.insert(pair_id.clone(), snapshot).is_some() {
            return;
        }
        admission.push_back(pair_id);

        while entries.len() > self.capacity {
            let Some(victim) = admission.pop_front() else {
                break;
            };
            entries.remove(&victim);
            debug!(evicted_pair = %victim, cache_size = entries.len(), "dedup cache full; evicted oldest pair");
        }
    }

    /// Returns a clone of the cached snapshot for `pair_id`.
    pub fn get(&self, pair_id: &str) -> Option<Snapshot> {
        self.inner.lock().entries.get(pair_id).cloned()
    }

    #[instrument(skip(self), target = "cache")]
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.admission.clear();

        info!(count, "dedup cache cleared");
    }
}

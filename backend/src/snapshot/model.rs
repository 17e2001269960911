use corelib::models::PairData;

use crate::time::MINUTE_MS;

/// One observation of one pair at one instant.
///
/// This is the only shape detectors and reports work with. Feed-origin
/// snapshots carry a [`FeedContext`] with the wider-window stats the stream
/// provides; snapshots loaded from the store never do, since those fields are
/// not persisted.
///
/// Prices stay as the decimal text the feed sent; they are parsed only when a
/// detector needs the number.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pair_id: String,
    pub base_symbol: String,
    pub base_address: String,

    pub price: String,
    pub price_usd: String,

    pub buys_5m: u64,
    pub sells_5m: u64,
    pub volume_5m: f64,
    pub volume_1h: f64,
    pub price_change_5m: f64,
    pub price_change_1h: f64,
    pub liquidity_usd: f64,
    pub market_cap: f64,

    /// Epoch ms, assigned when the snapshot is accepted for storage.
    pub timestamp_ms: u64,

    pub feed: Option<FeedContext>,
}

/// Feed-only context that is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedContext {
    pub chain_id: String,
    pub dex_id: String,
    pub pair_created_at_ms: Option<u64>,
    pub buys_1h: u64,
    pub sells_1h: u64,
    pub volume_6h: f64,
    pub volume_24h: f64,
    pub price_change_6h: f64,
    pub price_change_24h: f64,
}

impl Snapshot {
    /// Project a raw feed pair down to the internal snapshot.
    ///
    /// Missing liquidity becomes 0.
    pub fn from_feed(pair: &PairData, observed_at_ms: u64) -> Self {
        Self {
            pair_id: pair.pair_address.clone(),
            base_symbol: pair.base_token.symbol.clone(),
            base_address: pair.base_token.address.clone(),
            price: pair.price.clone(),
            price_usd: pair.price_usd.clone(),
            buys_5m: pair.txns.m5.buys,
            sells_5m: pair.txns.m5.sells,
            volume_5m: pair.volume.m5,
            volume_1h: pair.volume.h1,
            price_change_5m: pair.price_change.m5,
            price_change_1h: pair.price_change.h1,
            liquidity_usd: pair.liquidity.map(|l| l.usd).unwrap_or(0.0),
            market_cap: pair.market_cap,
            timestamp_ms: observed_at_ms,
            feed: Some(FeedContext {
                chain_id: pair.chain_id.clone(),
                dex_id: pair.dex_id.clone(),
                pair_created_at_ms: pair.pair_created_at,
                buys_1h: pair.txns.h1.buys,
                sells_1h: pair.txns.h1.sells,
                volume_6h: pair.volume.h6,
                volume_24h: pair.volume.h24,
                price_change_6h: pair.price_change.h6,
                price_change_24h: pair.price_change.h24,
            }),
        }
    }

    /// USD price as a number, if the stored text parses.
    pub fn price_usd_value(&self) -> Option<f64> {
        self.price_usd.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn txns_5m(&self) -> u64 {
        self.buys_5m + self.sells_5m
    }

    /// Pair age in minutes, when the creation time is known.
    pub fn pair_age_minutes(&self, now_ms: u64) -> Option<f64> {
        let created = self.feed.as_ref()?.pair_created_at_ms?;
        Some(now_ms.saturating_sub(created) as f64 / MINUTE_MS as f64)
    }

    /// Same observation with a new acceptance timestamp.
    pub fn stamped(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

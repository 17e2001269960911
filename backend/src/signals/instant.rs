//! Instant (fresh) detector bank.
//!
//! Compares the live snapshot of a pair with the most recent stored snapshot
//! that is at least `lookback` old, plus one static check on young pairs.
//! Every detector is evaluated independently.

use tracing::{debug, instrument};

use super::{Signal, ratio};
use crate::error::StoreError;
use crate::snapshot::{Snapshot, SnapshotRepository};

/// USD volume must more than triple (increase > 200%).
pub const VOLUME_SPIKE_MIN_INCREASE: f64 = 2.0;
/// Price must gain more than 10% against the reference.
pub const PRICE_GROWTH_MIN_INCREASE: f64 = 0.10;
pub const BUY_PRESSURE_MIN_RATIO: f64 = 2.0;
pub const BUY_PRESSURE_VOLUME_MULTIPLIER: f64 = 1.5;
pub const LIQUIDITY_MIN_GROWTH: f64 = 0.10;
pub const LIQUIDITY_ACCELERATION_FACTOR: f64 = 2.0;
pub const HOT_PAIR_MAX_AGE_MINUTES: f64 = 60.0;
pub const HOT_PAIR_MIN_TXNS_1H: u64 = 1000;
pub const HOT_PAIR_MIN_PRICE_CHANGE_1H: f64 = 20.0;

/// Runs the instant bank against `cur`.
///
/// `prev` is the reference snapshot; detectors 1-4 need it, the hot-pair
/// check does not.
pub fn detect_instant(cur: &Snapshot, prev: Option<&Snapshot>, now_ms: u64) -> Vec<Signal> {
    let mut signals = Vec::new();

    if let Some(prev) = prev {
        compare_with_previous(cur, prev, &mut signals);
    }

    if let Some(signal) = hot_new_pair(cur, now_ms) {
        signals.push(signal);
    }

    signals
}

fn compare_with_previous(cur: &Snapshot, prev: &Snapshot, signals: &mut Vec<Signal>) {
    let cur_price = cur.price_usd_value();
    let prev_price = prev.price_usd_value();

    if let (Some(cur_price), Some(prev_price)) = (cur_price, prev_price) {
        // 1. USD volume spike
        if let Some(r) = ratio(cur.volume_5m * cur_price, prev.volume_5m * prev_price) {
            let increase = r - 1.0;
            if increase > VOLUME_SPIKE_MIN_INCREASE {
                signals.push(Signal::VolumeSpike {
                    increase_pct: increase * 100.0,
                });
            }
        }

        // 2. Price growth confirmed by a positive hourly trend
        if let Some(r) = ratio(cur_price, prev_price) {
            let increase = r - 1.0;
            if increase > PRICE_GROWTH_MIN_INCREASE && cur.price_change_1h > 0.0 {
                signals.push(Signal::SustainedPriceGrowth {
                    increase_pct: increase * 100.0,
                });
            }
        }
    }

    // 3. Buy pressure on rising volume
    if let Some(price) = cur_price {
        let buy_volume = cur.buys_5m as f64 * price;
        let sell_volume = cur.sells_5m as f64 * price;
        let sell_volume = if sell_volume == 0.0 { 1.0 } else { sell_volume };

        if let Some(buy_sell) = ratio(buy_volume, sell_volume) {
            if buy_sell > BUY_PRESSURE_MIN_RATIO
                && cur.volume_5m > prev.volume_5m * BUY_PRESSURE_VOLUME_MULTIPLIER
            {
                signals.push(Signal::HighBuyPressure { ratio: buy_sell });
            }
        }
    }

    // 4. Liquidity acceleration.
    // The "reverse" rate is the same move measured from the current side, so
    // for small moves it is roughly -growth; the comparison is kept as-is.
    let growth = ratio(cur.liquidity_usd - prev.liquidity_usd, prev.liquidity_usd);
    let reverse = ratio(prev.liquidity_usd - cur.liquidity_usd, cur.liquidity_usd);
    if let (Some(growth), Some(reverse)) = (growth, reverse) {
        if growth > LIQUIDITY_MIN_GROWTH && growth > reverse * LIQUIDITY_ACCELERATION_FACTOR {
            if let Some(acceleration) = ratio(growth, reverse) {
                signals.push(Signal::AcceleratingLiquidityGrowth {
                    growth_pct: growth * 100.0,
                    acceleration,
                });
            }
        }
    }
}

/// 5. Young pair with heavy hourly activity and a strong hourly gain.
fn hot_new_pair(cur: &Snapshot, now_ms: u64) -> Option<Signal> {
    let age_minutes = cur.pair_age_minutes(now_ms)?;
    let feed = cur.feed.as_ref()?;
    let txns_1h = feed.buys_1h + feed.sells_1h;

    (age_minutes < HOT_PAIR_MAX_AGE_MINUTES
        && txns_1h > HOT_PAIR_MIN_TXNS_1H
        && cur.price_change_1h > HOT_PAIR_MIN_PRICE_CHANGE_1H)
        .then_some(Signal::HotNewPair {
            age_minutes,
            txns_1h,
            price_change_1h: cur.price_change_1h,
        })
}

/// Looks up the reference snapshot and runs the instant bank.
///
/// The reference is the latest stored snapshot older than
/// `now_ms - lookback_ms`.
#[instrument(skip(repo, cur), fields(pair_id = %cur.pair_id), level = "debug")]
pub async fn detect_fresh_signals(
    repo: &dyn SnapshotRepository,
    cur: &Snapshot,
    now_ms: u64,
    lookback_ms: u64,
) -> Result<Vec<Signal>, StoreError> {
    let cutoff = now_ms.saturating_sub(lookback_ms);
    let prev = repo.most_recent_before(&cur.pair_id, cutoff).await?;

    let signals = detect_instant(cur, prev.as_ref(), now_ms);
    debug!(
        has_reference = prev.is_some(),
        signals = signals.len(),
        "instant bank evaluated"
    );

    Ok(signals)
}

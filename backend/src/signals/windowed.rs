//! Windowed (deep) detector bank.
//!
//! Evaluates a pair's ascending snapshot history over a trailing window.
//! Endpoint checks compare the oldest and newest snapshot; series checks
//! walk every consecutive step.

use tracing::{debug, instrument};

use super::{Signal, growth_pct, ratio};
use crate::error::StoreError;
use crate::snapshot::{Snapshot, SnapshotRepository};
use crate::time::MINUTE_MS;

pub const MIN_SERIES_LEN: usize = 2;

pub const SUSTAINED_PRICE_MIN_PCT: f64 = 20.0;
pub const SUSTAINED_VOLUME_MIN_PCT: f64 = 100.0;
pub const LIQUIDITY_MIN_PCT: f64 = 50.0;
pub const TRADE_ACTIVITY_MIN_PCT: f64 = 200.0;
pub const TRADE_ACTIVITY_BUY_MULTIPLIER: f64 = 1.5;
pub const MARKET_CAP_MIN_PCT: f64 = 30.0;
pub const ACCELERATION_FACTOR: f64 = 2.0;
pub const ACCELERATION_MIN_RECENT_PCT: f64 = 5.0;

/// Runs the windowed bank over `series` (ascending by timestamp).
///
/// `window_minutes` only feeds the signal text. Fewer than two snapshots
/// yield nothing.
pub fn detect_windowed(series: &[Snapshot], window_minutes: u64) -> Vec<Signal> {
    let mut signals = Vec::new();

    let (Some(oldest), Some(newest)) = (series.first(), series.last()) else {
        return signals;
    };
    if series.len() < MIN_SERIES_LEN {
        return signals;
    }

    if let Some(s) = sustained_growth(oldest, newest, window_minutes) {
        signals.push(s);
    }
    if let Some(s) = strong_liquidity_growth(series, oldest, newest, window_minutes) {
        signals.push(s);
    }
    if let Some(s) = increasing_trade_activity(oldest, newest) {
        signals.push(s);
    }
    if let Some(s) = steady_market_cap_growth(series, oldest, newest) {
        signals.push(s);
    }
    if let Some(s) = accelerating_price_growth(series) {
        signals.push(s);
    }

    signals
}

fn sustained_growth(oldest: &Snapshot, newest: &Snapshot, window_minutes: u64) -> Option<Signal> {
    let price_growth_pct = growth_pct(newest.price_usd_value()?, oldest.price_usd_value()?)?;
    let volume_growth_pct = growth_pct(newest.volume_1h, oldest.volume_1h)?;

    (price_growth_pct > SUSTAINED_PRICE_MIN_PCT && volume_growth_pct > SUSTAINED_VOLUME_MIN_PCT)
        .then_some(Signal::SustainedGrowth {
            price_growth_pct,
            volume_growth_pct,
            window_minutes,
        })
}

fn strong_liquidity_growth(
    series: &[Snapshot],
    oldest: &Snapshot,
    newest: &Snapshot,
    window_minutes: u64,
) -> Option<Signal> {
    let growth_pct = growth_pct(newest.liquidity_usd, oldest.liquidity_usd)?;
    let monotone = series
        .windows(2)
        .all(|w| w[1].liquidity_usd >= w[0].liquidity_usd);

    (growth_pct > LIQUIDITY_MIN_PCT && monotone).then_some(Signal::StrongLiquidityGrowth {
        growth_pct,
        window_minutes,
    })
}

fn increasing_trade_activity(oldest: &Snapshot, newest: &Snapshot) -> Option<Signal> {
    let growth_pct = growth_pct(newest.txns_5m() as f64, oldest.txns_5m() as f64)?;
    let buy_heavy = newest.buys_5m as f64 > newest.sells_5m as f64 * TRADE_ACTIVITY_BUY_MULTIPLIER;

    (growth_pct > TRADE_ACTIVITY_MIN_PCT && buy_heavy)
        .then_some(Signal::IncreasingTradeActivity { growth_pct })
}

/// Total growth plus the mean of the `len - 1` step rates.
fn steady_market_cap_growth(
    series: &[Snapshot],
    oldest: &Snapshot,
    newest: &Snapshot,
) -> Option<Signal> {
    let total_pct = growth_pct(newest.market_cap, oldest.market_cap)?;

    let steps = series
        .windows(2)
        .map(|w| growth_pct(w[1].market_cap, w[0].market_cap))
        .collect::<Option<Vec<f64>>>()?;
    let avg_step_pct = ratio(steps.iter().sum(), steps.len() as f64)?;

    (total_pct > MARKET_CAP_MIN_PCT && avg_step_pct > 0.0).then_some(
        Signal::SteadyMarketCapGrowth {
            total_pct,
            avg_step_pct,
        },
    )
}

/// Price step rates with a leading zero for the first element; the mean is
/// taken over all `len` entries, zero included.
fn accelerating_price_growth(series: &[Snapshot]) -> Option<Signal> {
    let prices = series
        .iter()
        .map(Snapshot::price_usd_value)
        .collect::<Option<Vec<f64>>>()?;

    let mut rates = Vec::with_capacity(prices.len());
    rates.push(0.0);
    for w in prices.windows(2) {
        rates.push(growth_pct(w[1], w[0])?);
    }

    let avg_pct = ratio(rates.iter().sum(), rates.len() as f64)?;
    let recent_pct = *rates.last()?;

    (recent_pct > avg_pct * ACCELERATION_FACTOR && recent_pct > ACCELERATION_MIN_RECENT_PCT)
        .then_some(Signal::AcceleratingPriceGrowth {
            recent_pct,
            avg_pct,
        })
}

/// Loads the trailing window of `pair_id` and runs the windowed bank.
#[instrument(skip(repo), level = "debug")]
pub async fn detect_deep_signals(
    repo: &dyn SnapshotRepository,
    pair_id: &str,
    now_ms: u64,
    window_ms: u64,
) -> Result<Vec<Signal>, StoreError> {
    let cutoff = now_ms.saturating_sub(window_ms);
    let series = repo.all_since(pair_id, cutoff).await?;

    let signals = detect_windowed(&series, window_ms / MINUTE_MS);
    debug!(
        window_len = series.len(),
        signals = signals.len(),
        "windowed bank evaluated"
    );

    Ok(signals)
}

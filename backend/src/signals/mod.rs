//! Heuristic signal detectors.
//!
//! Two banks share one output type:
//! - [`instant`] compares a live snapshot against one earlier snapshot and a
//!   few static activity thresholds.
//! - [`windowed`] looks at a pair's whole trailing history.
//!
//! Detectors are pure functions over snapshots; the async wrappers only add
//! the store lookup in front of them.
//!
//! Division policy: every ratio goes through [`ratio`], which yields `None`
//! for a zero or non-finite denominator. A detector whose ratio is `None`
//! does not fire. The one explicit floor is the sell volume of
//! [`Signal::HighBuyPressure`] (zero becomes one).

pub mod instant;
pub mod windowed;

use std::fmt;

pub use instant::{detect_fresh_signals, detect_instant};
pub use windowed::{detect_deep_signals, detect_windowed};

/// A flagged anomaly with the magnitudes that triggered it.
///
/// `Display` renders the human-readable line used in reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    // ---- instant bank ----
    VolumeSpike {
        increase_pct: f64,
    },
    SustainedPriceGrowth {
        increase_pct: f64,
    },
    HighBuyPressure {
        ratio: f64,
    },
    AcceleratingLiquidityGrowth {
        growth_pct: f64,
        acceleration: f64,
    },
    HotNewPair {
        age_minutes: f64,
        txns_1h: u64,
        price_change_1h: f64,
    },

    // ---- windowed bank ----
    SustainedGrowth {
        price_growth_pct: f64,
        volume_growth_pct: f64,
        window_minutes: u64,
    },
    StrongLiquidityGrowth {
        growth_pct: f64,
        window_minutes: u64,
    },
    IncreasingTradeActivity {
        growth_pct: f64,
    },
    SteadyMarketCapGrowth {
        total_pct: f64,
        avg_step_pct: f64,
    },
    AcceleratingPriceGrowth {
        recent_pct: f64,
        avg_pct: f64,
    },
}

impl Signal {
    /// Short stable name, used as a log field.
    pub fn label(&self) -> &'static str {
        match self {
            Signal::VolumeSpike { .. } => "volume_spike",
            Signal::SustainedPriceGrowth { .. } => "sustained_price_growth",
            Signal::HighBuyPressure { .. } => "high_buy_pressure",
            Signal::AcceleratingLiquidityGrowth { .. } => "accelerating_liquidity_growth",
            Signal::HotNewPair { .. } => "hot_new_pair",
            Signal::SustainedGrowth { .. } => "sustained_growth",
            Signal::StrongLiquidityGrowth { .. } => "strong_liquidity_growth",
            Signal::IncreasingTradeActivity { .. } => "increasing_trade_activity",
            Signal::SteadyMarketCapGrowth { .. } => "steady_market_cap_growth",
            Signal::AcceleratingPriceGrowth { .. } => "accelerating_price_growth",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::VolumeSpike { increase_pct } => write!(
                f,
                "Volume Spike: {increase_pct:.2}% increase in 5-minute USD volume"
            ),
            Signal::SustainedPriceGrowth { increase_pct } => write!(
                f,
                "Sustained Price Growth: {increase_pct:.2}% in 5 minutes with positive 1h trend"
            ),
            Signal::HighBuyPressure { ratio } => write!(
                f,
                "High Buy Pressure: {ratio:.2} buy/sell volume ratio with increased overall volume"
            ),
            Signal::AcceleratingLiquidityGrowth {
                growth_pct,
                acceleration,
            } => write!(
                f,
                "Accelerating Liquidity Growth: {growth_pct:.2}% increase, {acceleration:.2}x acceleration"
            ),
            Signal::HotNewPair {
                age_minutes,
                txns_1h,
                price_change_1h,
            } => write!(
                f,
                "Hot New Pair: {age_minutes:.2} minutes old, {txns_1h} transactions, {price_change_1h:.2}% price increase in 1 hour"
            ),
            Signal::SustainedGrowth {
                price_growth_pct,
                volume_growth_pct,
                window_minutes,
            } => write!(
                f,
                "Sustained Growth: {price_growth_pct:.2}% price increase and {volume_growth_pct:.2}% volume increase over {window_minutes} minutes"
            ),
            Signal::StrongLiquidityGrowth {
                growth_pct,
                window_minutes,
            } => write!(
                f,
                "Strong Liquidity Growth: {growth_pct:.2}% increase with consistent growth over {window_minutes} minutes"
            ),
            Signal::IncreasingTradeActivity { growth_pct } => write!(
                f,
                "Increasing Trade Activity: {growth_pct:.2}% more transactions with strong buying pressure"
            ),
            Signal::SteadyMarketCapGrowth {
                total_pct,
                avg_step_pct,
            } => write!(
                f,
                "Steady Market Cap Growth: {total_pct:.2}% total increase with {avg_step_pct:.2}% average growth rate"
            ),
            Signal::AcceleratingPriceGrowth {
                recent_pct,
                avg_pct,
            } => write!(
                f,
                "Accelerating Price Growth: Recent growth rate {recent_pct:.2}% vs average {avg_pct:.2}%"
            ),
        }
    }
}

/// `num / den`, or `None` when the result would not be a finite number.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    let r = num / den;
    r.is_finite().then_some(r)
}

/// Percentage growth from `from` to `to`: `(to / from - 1) * 100`.
pub fn growth_pct(to: f64, from: f64) -> Option<f64> {
    ratio(to, from).map(|r| (r - 1.0) * 100.0)
}

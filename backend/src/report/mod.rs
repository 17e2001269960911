//! Human-readable signal reports.
//!
//! A report is built from the internal [`Snapshot`] only, so feed-origin and
//! store-origin snapshots render the same sections. Fields that only the feed
//! provides (pair age, 6h/24h figures) are printed when present.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::signals::Signal;
use crate::snapshot::Snapshot;

const TINYASTRO_LP_URL: &str = "https://photon-sol.tinyastro.io/en/lp";
const DEXSCREENER_URL: &str = "https://dexscreener.com";
const RUGCHECK_TOKEN_URL: &str = "https://rugcheck.xyz/tokens";

/// Which detector bank produced the signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Instant bank, evaluated on a live feed snapshot.
    Fresh,
    /// Windowed bank, evaluated by the batch pass.
    Deep,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Fresh => "FRESH",
            Freshness::Deep => "DEEP",
        }
    }
}

/// Deployment-level values the report needs.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Chain slug used in DexScreener links.
    pub chain_id: String,
}

/// Renders the report for `snapshot` and its triggered `signals`.
pub fn build_report(
    snapshot: &Snapshot,
    signals: &[Signal],
    freshness: Freshness,
    now_ms: u64,
    ctx: &ReportContext,
) -> String {
    let price = snapshot.price_usd_value();
    let usd = |amount: f64| match price {
        Some(p) => format!("${:.2}", amount * p),
        None => "N/A".to_string(),
    };
    let pair_age = match snapshot.pair_age_minutes(now_ms) {
        Some(minutes) => format!("{} minutes", minutes.floor()),
        None => "N/A".to_string(),
    };

    let mut out = String::new();

    // Writing into a String never fails.
    let _ = writeln!(out, "🚨 {} BUY SIGNAL DETECTED 🚨", freshness.as_str());
    let _ = writeln!(out);
    let _ = writeln!(out, "Token: ${}", snapshot.base_symbol);
    let _ = writeln!(out, "Contract Address: {}", snapshot.base_address);
    let _ = writeln!(out, "Pair Address: {}", snapshot.pair_id);
    let _ = writeln!(out);

    let _ = writeln!(out, "Signals Triggered:");
    for signal in signals {
        let _ = writeln!(out, "- {signal}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Token Info:");
    let _ = writeln!(out, "- Pair Age: {pair_age}");
    let _ = writeln!(out, "- Liquidity: ${:.2}", snapshot.liquidity_usd);
    let _ = writeln!(out, "- Market Cap: ${:.0}", snapshot.market_cap);
    let _ = writeln!(out, "- Price: ${}", snapshot.price_usd);
    let _ = writeln!(out);

    let _ = writeln!(out, "Volume:");
    let _ = writeln!(out, "- 5m: {}", usd(snapshot.volume_5m));
    let _ = writeln!(out, "- 1h: {}", usd(snapshot.volume_1h));
    if let Some(feed) = &snapshot.feed {
        let _ = writeln!(out, "- 6h: {}", usd(feed.volume_6h));
        let _ = writeln!(out, "- 24h: {}", usd(feed.volume_24h));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Transactions (5m):");
    let _ = writeln!(out, "- Buys: {}", snapshot.buys_5m);
    let _ = writeln!(out, "- Sells: {}", snapshot.sells_5m);
    let _ = writeln!(out);

    let _ = writeln!(out, "Price Change:");
    let _ = writeln!(out, "- 5m: {}%", snapshot.price_change_5m);
    let _ = writeln!(out, "- 1h: {}%", snapshot.price_change_1h);
    if let Some(feed) = &snapshot.feed {
        let _ = writeln!(out, "- 6h: {}%", feed.price_change_6h);
        let _ = writeln!(out, "- 24h: {}%", feed.price_change_24h);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Links:");
    let _ = writeln!(out, "- TinyAstro: {TINYASTRO_LP_URL}/{}", snapshot.base_address);
    let _ = writeln!(
        out,
        "- DexScreener: {DEXSCREENER_URL}/{}/{}",
        ctx.chain_id, snapshot.pair_id
    );
    let _ = writeln!(out, "- RugCheck: {RUGCHECK_TOKEN_URL}/{}", snapshot.base_address);
    let _ = writeln!(out);

    let _ = writeln!(out, "Observed: {}", format_ts(snapshot.timestamp_ms));
    let _ = writeln!(out);
    out.push_str("Always DYOR before investing!");

    out
}

fn format_ts(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FeedContext;
    use crate::time::MINUTE_MS;

    const NOW: u64 = 1_700_000_000_000;

    fn stored() -> Snapshot {
        Snapshot {
            pair_id: "PAIRADDR".into(),
            base_symbol: "BONK".into(),
            base_address: "MINTADDR".into(),
            price: "0.5".into(),
            price_usd: "2.0".into(),
            buys_5m: 10,
            sells_5m: 1,
            volume_5m: 80.0,
            volume_1h: 900.0,
            price_change_5m: 3.5,
            price_change_1h: 25.0,
            liquidity_usd: 1234.567,
            market_cap: 98765.4,
            timestamp_ms: NOW,
            feed: None,
        }
    }

    fn ctx() -> ReportContext {
        ReportContext {
            chain_id: "solana".into(),
        }
    }

    #[test]
    fn deep_report_from_stored_snapshot() {
        let signals = vec![Signal::IncreasingTradeActivity { growth_pct: 250.0 }];
        let report = build_report(&stored(), &signals, Freshness::Deep, NOW, &ctx());

        assert!(report.starts_with("🚨 DEEP BUY SIGNAL DETECTED 🚨\n"));
        assert!(report.contains("Token: $BONK\n"));
        assert!(report.contains("Contract Address: MINTADDR\n"));
        assert!(report.contains("Pair Address: PAIRADDR\n"));
        assert!(report.contains(
            "Signals Triggered:\n- Increasing Trade Activity: 250.00% more transactions with strong buying pressure\n"
        ));
        assert!(report.contains("- Pair Age: N/A\n"));
        assert!(report.contains("- Liquidity: $1234.57\n"));
        assert!(report.contains("- Market Cap: $98765\n"));
        assert!(report.contains("- Price: $2.0\n"));
        assert!(report.contains("- 5m: $160.00\n- 1h: $1800.00\n\n"));
        assert!(report.contains("- Buys: 10\n- Sells: 1\n"));
        assert!(report.contains("- 5m: 3.5%\n- 1h: 25%\n\n"));
        assert!(!report.contains("- 6h:"));
        assert!(report.contains("- DexScreener: https://dexscreener.com/solana/PAIRADDR\n"));
        assert!(report.contains("- RugCheck: https://rugcheck.xyz/tokens/MINTADDR\n"));
        assert!(report.contains("Observed: 2023-11-14 22:13:20 UTC\n"));
        assert!(report.ends_with("Always DYOR before investing!"));
    }

    #[test]
    fn fresh_report_includes_feed_only_sections() {
        let mut snap = stored();
        snap.feed = Some(FeedContext {
            chain_id: "solana".into(),
            dex_id: "raydium".into(),
            pair_created_at_ms: Some(NOW - 10 * MINUTE_MS - 30_000),
            buys_1h: 600,
            sells_1h: 500,
            volume_6h: 5000.0,
            volume_24h: 20000.0,
            price_change_6h: 40.0,
            price_change_24h: 90.0,
        });

        let signals = vec![Signal::HighBuyPressure { ratio: 10.0 }];
        let report = build_report(&snap, &signals, Freshness::Fresh, NOW, &ctx());

        assert!(report.starts_with("🚨 FRESH BUY SIGNAL DETECTED 🚨\n"));
        assert!(report.contains("- Pair Age: 10 minutes\n"));
        assert!(report.contains("- 6h: $10000.00\n- 24h: $40000.00\n"));
        assert!(report.contains("- 6h: 40%\n- 24h: 90%\n"));
    }

    #[test]
    fn unparseable_price_renders_na_volumes() {
        let mut snap = stored();
        snap.price_usd = "?".into();

        let report = build_report(&snap, &[], Freshness::Deep, NOW, &ctx());
        assert!(report.contains("- 5m: N/A\n- 1h: N/A\n"));
    }

    #[test]
    fn links_follow_configured_chain() {
        let ctx = ReportContext {
            chain_id: "base".into(),
        };
        let report = build_report(&stored(), &[], Freshness::Deep, NOW, &ctx);
        assert!(report.contains("https://dexscreener.com/base/PAIRADDR"));
    }
}

//! Wire models for the DexScreener screener stream.
//!
//! These mirror the JSON shape pushed by `io.dexscreener.com` for every pair
//! in a screener page. Only the fields the engine consumes are modelled;
//! everything else is ignored by serde.
//!
//! Fields the engine cannot work without (`txns.m5`, `volume.h1`, ...) are
//! required, so an entry missing them fails to decode and can be dropped on
//! its own without poisoning the rest of the batch. Wider windows (6h/24h)
//! and liquidity are optional on the wire and default to zero.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level frame of a screener message.
///
/// Pairs are kept as raw JSON so that each entry can be decoded (and
/// rejected) individually.
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenerFrame {
    #[serde(default)]
    pub pairs: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PairData {
    pub chain_id: String,
    #[serde(default)]
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: TokenInfo,
    pub price: String,
    pub price_usd: String,
    pub txns: TxnWindows,
    pub volume: WindowedValues,
    pub price_change: WindowedValues,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(default)]
    pub market_cap: f64,
    /// Epoch milliseconds.
    #[serde(default)]
    pub pair_created_at: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TokenInfo {
    #[serde(default)]
    pub name: String,
    pub symbol: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
pub struct TxnCount {
    pub buys: u64,
    pub sells: u64,
}

impl TxnCount {
    pub fn total(&self) -> u64 {
        self.buys + self.sells
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TxnWindows {
    pub m5: TxnCount,
    pub h1: TxnCount,
    #[serde(default)]
    pub h6: TxnCount,
    #[serde(default)]
    pub h24: TxnCount,
}

/// Volume or price change, keyed by trailing window.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WindowedValues {
    pub m5: f64,
    pub h1: f64,
    #[serde(default)]
    pub h6: f64,
    #[serde(default)]
    pub h24: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
pub struct Liquidity {
    #[serde(default)]
    pub usd: f64,
    #[serde(default)]
    pub base: f64,
    #[serde(default)]
    pub quote: f64,
}

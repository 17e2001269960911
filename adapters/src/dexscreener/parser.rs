//! DexScreener screener message parser.
//!
//! The screener socket pushes one JSON document per frame. Frames that carry
//! market data look like:
//!
//! ```jsonc
//! {
//!   "type": "pairs",
//!   "stats": { /* page level stats */ },
//!   "pairs": [ { "chainId": "solana", "pairAddress": "...", ... }, ... ]
//! }
//! ```
//!
//! Everything else (stats-only frames, pongs, page metadata) has no `pairs`
//! array and is ignored.
//!
//! Entries inside `pairs` are decoded one at a time: an entry missing a
//! required nested field is counted in [`FeedBatch::malformed`] and dropped,
//! while its siblings still make it into the batch.

use corelib::models::{PairData, ScreenerFrame};
use tracing::debug;

use super::FeedError;

/// One screener frame worth of decoded pairs.
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    pub pairs: Vec<PairData>,
    /// Entries that failed to decode.
    pub malformed: usize,
}

impl FeedBatch {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.malformed == 0
    }
}

/// Parse a raw screener frame.
///
/// Returns `Ok(None)` for frames without a `pairs` array and `Err` only when
/// the frame itself is not valid JSON.
pub fn parse_screener_message(raw: &str) -> Result<Option<FeedBatch>, FeedError> {
    let frame: ScreenerFrame = serde_json::from_str(raw)?;

    let Some(entries) = frame.pairs else {
        return Ok(None);
    };

    let mut batch = FeedBatch {
        pairs: Vec::with_capacity(entries.len()),
        malformed: 0,
    };

    for entry in entries {
        match serde_json::from_value::<PairData>(entry) {
            Ok(pair) => batch.pairs.push(pair),
            Err(e) => {
                debug!(error = %e, "dropping malformed screener entry");
                batch.malformed += 1;
            }
        }
    }

    Ok(Some(batch))
}

pub mod errors;
pub mod parser;
pub mod provider;
pub mod ws;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

pub use errors::FeedError;
pub use parser::{FeedBatch, parse_screener_message};
pub use provider::DexScreenerProvider;
pub use ws::DexScreenerWsClient;

/// Screener ranked by 6h trending score.
pub const WS_TRENDING: &str = "wss://io.dexscreener.com/dex/screener/pairs/h24/1?rankBy[key]=trendingScoreH6&rankBy[order]=desc";

/// Top 24h gainers with liquidity, activity and volume floors.
pub const WS_GAINERS: &str = "wss://io.dexscreener.com/dex/screener/pairs/h24/1?rankBy[key]=priceChangeH24&rankBy[order]=desc&filters[liquidity][min]=25000&filters[txns][h24][min]=50&filters[volume][h24][min]=10000";

/// Pairs younger than 24h ranked by volume.
pub const WS_NEWEST: &str = "wss://io.dexscreener.com/dex/screener/pairs/h24/1?rankBy[key]=volume&rankBy[order]=desc&filters[pairAge][max]=24";

/// A source of screener batches.
///
/// Implementations own connection management (reconnects, keep-alive) and
/// only return once the receiving side of `sender` is gone.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn stream_batches(&self, sender: Sender<FeedBatch>) -> anyhow::Result<()>;
}

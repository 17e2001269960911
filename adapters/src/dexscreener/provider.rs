use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use super::{FeedBatch, FeedProvider, ws::DexScreenerWsClient};

pub struct DexScreenerProvider {
    client: DexScreenerWsClient,
}

impl DexScreenerProvider {
    pub fn new(ws_url: String) -> Result<Self, super::FeedError> {
        Ok(Self {
            client: DexScreenerWsClient::new(ws_url)?,
        })
    }
}

#[async_trait]
impl FeedProvider for DexScreenerProvider {
    async fn stream_batches(&self, sender: Sender<FeedBatch>) -> anyhow::Result<()> {
        self.client.run_ws_loop(sender).await
    }
}

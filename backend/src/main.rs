use std::sync::Arc;
use std::time::Duration;

use adapters::dexscreener::{DexScreenerProvider, FeedBatch, FeedProvider};
use pairwatch::{
    batch::BatchDriver,
    config::AppConfig,
    db::Db,
    ingest::{DedupCache, FreshReporter, Ingestor},
    logger::{LogFormat, init_tracing},
    metrics::Counters,
    notify::{Notifier, TelegramNotifier},
    report::ReportContext,
    snapshot::{SnapshotRepository, SqlxSnapshotRepository},
};
use tokio::sync::mpsc;

/// Opens the database, applies the schema and returns the snapshot store.
async fn init_repository(cfg: &AppConfig) -> anyhow::Result<Arc<dyn SnapshotRepository>> {
    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;

    let repo: Arc<dyn SnapshotRepository> = Arc::new(SqlxSnapshotRepository::new(db.pool.clone()));
    Ok(repo)
}

/// Spawns one connection task per configured screener stream. All of them
/// feed the same ingestion queue.
fn start_feeds(cfg: &AppConfig, tx: mpsc::Sender<FeedBatch>) -> anyhow::Result<()> {
    for url in &cfg.feed_urls {
        let provider = DexScreenerProvider::new(url.clone())?;
        let tx = tx.clone();
        let url = url.clone();

        tokio::spawn(async move {
            if let Err(e) = provider.stream_batches(tx).await {
                tracing::error!(error = ?e, feed_url = %url, "feed task exited");
            }
        });
    }

    Ok(())
}

/// Starts the single ingestion consumer.
fn start_ingestion(
    cfg: &AppConfig,
    repo: Arc<dyn SnapshotRepository>,
    notifier: Arc<dyn Notifier>,
    counters: Counters,
    rx: mpsc::Receiver<FeedBatch>,
) {
    let cache = Arc::new(DedupCache::new(cfg.dedup_cache_capacity));
    let mut ingestor = Ingestor::new(repo, cache, cfg.chain_id.clone(), counters);

    if cfg.fresh_signals_enabled {
        ingestor = ingestor.with_fresh_reporter(FreshReporter {
            notifier,
            report_ctx: ReportContext {
                chain_id: cfg.chain_id.clone(),
            },
            lookback_ms: cfg.fresh_lookback_ms,
        });
    }

    tokio::spawn(Arc::new(ingestor).run(rx));
}

/// Starts the fixed-cadence deep pass.
fn start_batch_loop(
    cfg: &AppConfig,
    repo: Arc<dyn SnapshotRepository>,
    notifier: Arc<dyn Notifier>,
    counters: Counters,
) {
    let driver = Arc::new(BatchDriver::new(
        repo,
        notifier,
        ReportContext {
            chain_id: cfg.chain_id.clone(),
        },
        cfg.deep_window_ms,
        counters,
    ));

    tokio::spawn(driver.run(Duration::from_millis(cfg.batch_interval_ms)));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_env = std::env::var("APP_ENV").ok();
    init_tracing(LogFormat::for_env(app_env.as_deref()));

    tracing::info!("Starting pairwatch...");

    let cfg = AppConfig::from_env()?;

    let repo = init_repository(&cfg).await?;
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(
        cfg.telegram_api_url.clone(),
        cfg.telegram_bot_token.clone(),
        cfg.telegram_chat_id.clone(),
    )?);
    let counters = Counters::default();

    let (feed_tx, feed_rx) = mpsc::channel::<FeedBatch>(cfg.ingest_queue_capacity.max(1));

    start_ingestion(&cfg, repo.clone(), notifier.clone(), counters.clone(), feed_rx);
    start_batch_loop(&cfg, repo, notifier, counters.clone());
    start_feeds(&cfg, feed_tx)?;

    tracing::info!(
        feeds = cfg.feed_urls.len(),
        chain_id = %cfg.chain_id,
        fresh_signals = cfg.fresh_signals_enabled,
        deep_window_minutes = cfg.deep_window_minutes(),
        "pairwatch running"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!(
        inserted = Counters::read(&counters.ingest_inserted),
        reports_sent = Counters::read(&counters.reports_sent),
        "Shutdown signal received"
    );

    Ok(())
}

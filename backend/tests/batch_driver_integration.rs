mod common;

use std::sync::Arc;

use tracing_test::traced_test;

use common::{MockRepository, RecordingNotifier, setup_db, snapshot};
use pairwatch::batch::{BatchDriver, BatchSummary};
use pairwatch::metrics::Counters;
use pairwatch::report::ReportContext;
use pairwatch::signals::Signal;
use pairwatch::snapshot::{Snapshot, SnapshotRepository, SqlxSnapshotRepository};
use pairwatch::time::MINUTE_MS;

const WINDOW_MS: u64 = 30 * MINUTE_MS;
const NOW: u64 = 1_700_000_000_000;

fn point(pair_id: &str, ts: u64, price_usd: &str, volume_1h: f64, liquidity_usd: f64, market_cap: f64) -> Snapshot {
    let mut s = snapshot(pair_id, ts);
    s.price_usd = price_usd.into();
    s.volume_1h = volume_1h;
    s.liquidity_usd = liquidity_usd;
    s.market_cap = market_cap;
    s
}

/// The thirty-minute growth scenario, shifted so both points sit inside the
/// window ending at `NOW`.
async fn seed_growing_pair(repo: &dyn SnapshotRepository, pair_id: &str) {
    repo.insert(&point(pair_id, NOW - WINDOW_MS + 1, "1.00", 100.0, 1000.0, 10_000.0))
        .await
        .unwrap();
    repo.insert(&point(pair_id, NOW, "1.25", 250.0, 2000.0, 14_000.0))
        .await
        .unwrap();
}

fn driver(repo: Arc<dyn SnapshotRepository>, notifier: Arc<RecordingNotifier>) -> BatchDriver {
    BatchDriver::new(
        repo,
        notifier,
        ReportContext {
            chain_id: "solana".into(),
        },
        WINDOW_MS,
        Counters::default(),
    )
}

#[tokio::test]
async fn growing_pair_produces_deep_report() {
    let pool = setup_db().await;
    let repo: Arc<dyn SnapshotRepository> = Arc::new(SqlxSnapshotRepository::new(pool));
    seed_growing_pair(repo.as_ref(), "GROW").await;
    // flat pair: active but nothing to report
    repo.insert(&snapshot("FLAT", NOW - 1_000)).await.unwrap();
    repo.insert(&snapshot("FLAT", NOW)).await.unwrap();

    let notifier = RecordingNotifier::new();
    let summary = driver(repo, notifier.clone()).run_once(NOW).await;

    assert_eq!(
        summary,
        BatchSummary {
            pairs_scanned: 2,
            pairs_flagged: 1,
            pairs_failed: 0,
            reports_sent: 1,
            reports_failed: 0,
        }
    );

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let report = &sent[0];
    assert!(report.starts_with("🚨 DEEP BUY SIGNAL DETECTED 🚨"));
    assert!(report.contains("Pair Address: GROW\n"));
    assert!(report.contains(
        "- Sustained Growth: 25.00% price increase and 150.00% volume increase over 30 minutes\n"
    ));
    assert!(report.contains(
        "- Strong Liquidity Growth: 100.00% increase with consistent growth over 30 minutes\n"
    ));
    assert!(report.contains(
        "- Steady Market Cap Growth: 40.00% total increase with 40.00% average growth rate\n"
    ));
    assert!(!report.contains("Accelerating Price Growth"));
    assert!(report.contains("- Pair Age: N/A\n"));
}

#[tokio::test]
async fn evaluation_is_idempotent_on_unchanged_store() {
    let pool = setup_db().await;
    let repo: Arc<dyn SnapshotRepository> = Arc::new(SqlxSnapshotRepository::new(pool));
    seed_growing_pair(repo.as_ref(), "A").await;
    seed_growing_pair(repo.as_ref(), "B").await;

    let d = driver(repo, RecordingNotifier::new());
    let first = d.evaluate(NOW).await.unwrap();
    let second = d.evaluate(NOW).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.flagged.len(), 2);
    assert_eq!(first.flagged[0].snapshot.pair_id, "A");
    assert!(matches!(first.flagged[0].signals[0], Signal::SustainedGrowth { .. }));
}

#[tokio::test]
async fn pairs_outside_window_are_ignored() {
    let pool = setup_db().await;
    let repo: Arc<dyn SnapshotRepository> = Arc::new(SqlxSnapshotRepository::new(pool));
    seed_growing_pair(repo.as_ref(), "OLD").await;

    let notifier = RecordingNotifier::new();
    // an hour later the pair has had no activity inside the window
    let summary = driver(repo, notifier.clone()).run_once(NOW + 2 * WINDOW_MS).await;

    assert_eq!(summary.pairs_scanned, 0);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
#[traced_test]
async fn delivery_failure_does_not_stop_remaining_pairs() {
    let repo = MockRepository::new();
    seed_growing_pair(repo.as_ref(), "A").await;
    seed_growing_pair(repo.as_ref(), "B").await;

    let notifier = RecordingNotifier::new();
    notifier.reject_reports_for("A");

    let summary = driver(repo, notifier.clone()).run_once(NOW).await;

    assert_eq!(summary.reports_failed, 1);
    assert_eq!(summary.reports_sent, 1);
    assert_eq!(notifier.sent().len(), 1);
    assert!(notifier.sent()[0].contains("Pair Address: B\n"));
    assert!(logs_contain("report delivery failed"));
}

#[tokio::test]
#[traced_test]
async fn window_query_failure_is_isolated_to_its_pair() {
    let repo = MockRepository::new();
    seed_growing_pair(repo.as_ref(), "A").await;
    seed_growing_pair(repo.as_ref(), "B").await;
    repo.fail_window_for("A");

    let notifier = RecordingNotifier::new();
    let summary = driver(repo, notifier.clone()).run_once(NOW).await;

    assert_eq!(summary.pairs_scanned, 2);
    assert_eq!(summary.pairs_failed, 1);
    assert_eq!(summary.reports_sent, 1);
    assert!(notifier.sent()[0].contains("Pair Address: B\n"));
    assert!(logs_contain("window query failed"));
}

#[tokio::test]
#[traced_test]
async fn failed_pair_scan_aborts_pass_without_panicking() {
    let repo = MockRepository::new();
    seed_growing_pair(repo.as_ref(), "A").await;
    repo.fail_scan();

    let notifier = RecordingNotifier::new();
    let summary = driver(repo, notifier.clone()).run_once(NOW).await;

    assert_eq!(summary, BatchSummary::default());
    assert!(notifier.sent().is_empty());
    assert!(logs_contain("batch pass aborted"));
}

#[tokio::test(start_paused = true)]
async fn loop_waits_a_full_period_before_first_pass() {
    let repo = MockRepository::new();
    let notifier = RecordingNotifier::new();
    let d = Arc::new(driver(repo.clone(), notifier.clone()));

    let period = std::time::Duration::from_secs(30 * 60);
    let handle = tokio::spawn(d.run(period));

    tokio::time::sleep(period / 2).await;
    // nothing active yet; seed real-time rows so the first pass has work
    let now = pairwatch::time::now_ms();
    repo.insert(&point("LATE", now - 1_000, "1.00", 100.0, 1000.0, 10_000.0))
        .await
        .unwrap();
    repo.insert(&point("LATE", now, "1.25", 250.0, 2000.0, 14_000.0))
        .await
        .unwrap();
    assert!(notifier.sent().is_empty());

    tokio::time::sleep(period).await;
    assert_eq!(notifier.sent().len(), 1);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn zero_period_loop_keeps_running() {
    let repo = MockRepository::new();
    let d = Arc::new(driver(repo, RecordingNotifier::new()));

    let handle = tokio::spawn(d.run(std::time::Duration::ZERO));
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    assert!(!handle.is_finished());
    handle.abort();
}

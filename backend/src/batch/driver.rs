//! Periodic deep pass over recently active pairs.
//!
//! Responsibilities:
//! - Find every pair with a snapshot inside the trailing window.
//! - Run the windowed detector bank over each pair's window.
//! - Render and deliver a DEEP report for every flagged pair.
//!
//! Each pair is an isolated unit of work: a failed window query or a failed
//! delivery is logged and the pass moves on to the next pair.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, debug, error, info, warn};

use crate::error::StoreError;
use crate::logger::{TraceId, annotate_span, child_span, root_span, warn_if_slow};
use crate::metrics::Counters;
use crate::notify::Notifier;
use crate::report::{Freshness, ReportContext, build_report};
use crate::signals::{Signal, detect_deep_signals};
use crate::snapshot::{Snapshot, SnapshotRepository};
use crate::time::now_ms;

/// A pair whose window triggered at least one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSignals {
    /// Latest stored snapshot of the pair.
    pub snapshot: Snapshot,
    pub signals: Vec<Signal>,
}

/// Detection result of one pass, before any delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub flagged: Vec<PairSignals>,
    pub pairs_scanned: usize,
    pub pairs_failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub pairs_scanned: usize,
    pub pairs_flagged: usize,
    pub pairs_failed: usize,
    pub reports_sent: usize,
    pub reports_failed: usize,
}

pub struct BatchDriver {
    repo: Arc<dyn SnapshotRepository>,
    notifier: Arc<dyn Notifier>,
    report_ctx: ReportContext,
    window_ms: u64,
    counters: Counters,
}

impl BatchDriver {
    pub fn new(
        repo: Arc<dyn SnapshotRepository>,
        notifier: Arc<dyn Notifier>,
        report_ctx: ReportContext,
        window_ms: u64,
        counters: Counters,
    ) -> Self {
        Self {
            repo,
            notifier,
            report_ctx,
            window_ms,
            counters,
        }
    }

    /// Runs the windowed bank for every active pair without delivering
    /// anything. Fails only when the active-pair lookup itself fails.
    pub async fn evaluate(&self, now_ms: u64) -> Result<Evaluation, StoreError> {
        let cutoff = now_ms.saturating_sub(self.window_ms);

        let latest = warn_if_slow(
            "latest_per_pair_since",
            Duration::from_millis(500),
            self.repo.latest_per_pair_since(cutoff),
        )
        .await?;

        let mut eval = Evaluation {
            pairs_scanned: latest.len(),
            ..Evaluation::default()
        };

        for snapshot in latest {
            let span = child_span("pair_window");
            let outcome = async {
                annotate_span(&snapshot.pair_id);
                warn_if_slow(
                    "detect_deep_signals",
                    Duration::from_millis(200),
                    detect_deep_signals(self.repo.as_ref(), &snapshot.pair_id, now_ms, self.window_ms),
                )
                .await
            }
            .instrument(span)
            .await;

            match outcome {
                Ok(signals) if signals.is_empty() => {}
                Ok(signals) => {
                    debug!(
                        pair_id = %snapshot.pair_id,
                        signals = ?signals.iter().map(|s| s.label()).collect::<Vec<_>>(),
                        "deep signals detected"
                    );
                    eval.flagged.push(PairSignals { snapshot, signals });
                }
                Err(e) => {
                    eval.pairs_failed += 1;
                    warn!(pair_id = %snapshot.pair_id, error = %e, "window query failed; pair skipped");
                }
            }
        }

        Ok(eval)
    }

    /// One full pass: evaluate, then deliver a report per flagged pair.
    pub async fn run_once(&self, now_ms: u64) -> BatchSummary {
        let trace_id = TraceId::generate();
        let span = root_span("batch_pass", &trace_id);

        async {
            let eval = match self.evaluate(now_ms).await {
                Ok(e) => e,
                Err(e) => {
                    error!(error = %e, "active pair lookup failed; batch pass aborted");
                    return BatchSummary::default();
                }
            };

            let mut summary = BatchSummary {
                pairs_scanned: eval.pairs_scanned,
                pairs_flagged: eval.flagged.len(),
                pairs_failed: eval.pairs_failed,
                ..BatchSummary::default()
            };

            for flagged in &eval.flagged {
                if self.deliver(flagged, now_ms).await {
                    summary.reports_sent += 1;
                } else {
                    summary.reports_failed += 1;
                }
            }

            Counters::bump(&self.counters.batch_passes, 1);
            Counters::bump(&self.counters.batch_pair_failed, summary.pairs_failed as u64);
            Counters::bump(&self.counters.reports_sent, summary.reports_sent as u64);
            Counters::bump(&self.counters.reports_failed, summary.reports_failed as u64);

            info!(
                scanned = summary.pairs_scanned,
                flagged = summary.pairs_flagged,
                failed = summary.pairs_failed,
                sent = summary.reports_sent,
                "batch pass finished"
            );

            summary
        }
        .instrument(span)
        .await
    }

    async fn deliver(&self, flagged: &PairSignals, now_ms: u64) -> bool {
        let span = child_span("deliver_report");
        async {
            annotate_span(&flagged.snapshot.pair_id);

            let report = build_report(
                &flagged.snapshot,
                &flagged.signals,
                Freshness::Deep,
                now_ms,
                &self.report_ctx,
            );

            match warn_if_slow("notify_deep", Duration::from_secs(2), self.notifier.send(&report)).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(pair_id = %flagged.snapshot.pair_id, error = %e, "report delivery failed");
                    false
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Fires [`run_once`](Self::run_once) every `period`, first one after a
    /// full period has elapsed.
    pub async fn run(self: Arc<Self>, period: Duration) {
        // interval panics on a zero period
        let period = period.max(Duration::from_millis(1));
        let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = period.as_secs(), window_ms = self.window_ms, "batch loop started");

        loop {
            ticker.tick().await;
            self.run_once(now_ms()).await;
        }
    }
}

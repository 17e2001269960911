use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Output format of the process-wide subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// JSON in production, pretty everywhere else.
    pub fn for_env(app_env: Option<&str>) -> Self {
        match app_env.map(str::trim) {
            Some(env) if env.eq_ignore_ascii_case("production") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Correlation id shared by every log line of one batch pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceId(String);

impl TraceId {
    pub fn new(v: impl Into<String>) -> Self {
        Self(v.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Returns false if a subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        // span close events carry busy/idle timing
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Json => registry.with(base.json()).try_init(),
        LogFormat::Pretty => registry.with(base.pretty()).try_init(),
    };

    installed.is_ok()
}

/// Span for one unit of scheduled work, e.g. a batch pass.
pub fn root_span(pass: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "pass",
        pass = %pass,
        trace_id = %trace_id.as_str(),
        pair_id = field::Empty
    )
}

/// Span for one stage inside a pass; `pair_id` is filled in later.
pub fn child_span(stage: &'static str) -> Span {
    tracing::info_span!("stage", stage = %stage, pair_id = field::Empty)
}

/// Records the pair being worked on into the current span.
pub fn annotate_span(pair_id: &str) {
    Span::current().record("pair_id", field::display(pair_id));
}

/// Awaits `fut`, logging a warning under the `performance` target if it
/// took longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label,
            elapsed_ms = elapsed.as_millis() as u64,
            max_ms = max.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}

use std::str::FromStr;

use crate::error::AppError;
use crate::time::{MINUTE_MS, SECOND_MS};

const DEFAULT_FEED_URL: &str = adapters::dexscreener::WS_GAINERS;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    // =========================
    // Feed configuration
    // =========================
    /// Screener streams to subscribe to. Each one gets its own connection
    /// task; all of them feed the same ingestion queue.
    pub feed_urls: Vec<String>,

    /// The only chain whose pairs are ingested. Everything else in a feed
    /// batch is dropped before dedup or storage.
    pub chain_id: String,

    /// Capacity of the channel between feed connections and ingestion.
    ///
    /// Acts as backpressure: a slow store stalls the socket readers rather
    /// than growing memory.
    pub ingest_queue_capacity: usize,

    /// Upper bound on pairs remembered by the dedup cache.
    pub dedup_cache_capacity: usize,

    // =========================
    // Detection configuration
    // =========================
    /// Cadence of the windowed (deep) batch pass.
    pub batch_interval_ms: u64,

    /// Trailing window evaluated by the deep pass.
    pub deep_window_ms: u64,

    /// Minimum age of the snapshot the instant detectors compare against.
    pub fresh_lookback_ms: u64,

    /// Run the instant detector bank on every accepted feed snapshot.
    pub fresh_signals_enabled: bool,

    // =========================
    // Notification configuration
    // =========================
    pub telegram_api_url: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let feed_urls = match get("FEED_URLS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => vec![DEFAULT_FEED_URL.to_string()],
        };

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://tokendata.db?mode=rwc".to_string()),

            feed_urls,
            chain_id: get("CHAIN_ID").unwrap_or_else(|| "solana".to_string()),
            ingest_queue_capacity: parse_or(&get, "INGEST_QUEUE_CAPACITY", 256)?,
            dedup_cache_capacity: parse_or(&get, "DEDUP_CACHE_CAPACITY", 50_000)?,

            batch_interval_ms: secs_as_ms(&get, "BATCH_INTERVAL_SECS", 30 * 60)?,
            deep_window_ms: secs_as_ms(&get, "DEEP_WINDOW_SECS", 30 * 60)?,
            fresh_lookback_ms: secs_as_ms(&get, "FRESH_LOOKBACK_SECS", 5 * 60)?,
            fresh_signals_enabled: parse_or(&get, "FRESH_SIGNALS_ENABLED", false)?,

            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".to_string()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN")
                .ok_or(AppError::MissingSetting("TELEGRAM_BOT_TOKEN"))?,
            telegram_chat_id: get("TELEGRAM_CHAT_ID")
                .ok_or(AppError::MissingSetting("TELEGRAM_CHAT_ID"))?,
        })
    }

    pub fn deep_window_minutes(&self) -> u64 {
        self.deep_window_ms / MINUTE_MS
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| AppError::InvalidSetting {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}

/// A positive number of seconds, returned in milliseconds.
fn secs_as_ms<G>(get: &G, key: &'static str, default_secs: u64) -> Result<u64, AppError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(get, key, default_secs)?;
    secs.checked_mul(SECOND_MS)
        .filter(|ms| *ms > 0)
        .ok_or_else(|| AppError::InvalidSetting {
            key,
            value: secs.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_set() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]))
        .unwrap();

        assert_eq!(cfg.chain_id, "solana");
        assert_eq!(cfg.feed_urls, vec![DEFAULT_FEED_URL.to_string()]);
        assert_eq!(cfg.batch_interval_ms, 30 * MINUTE_MS);
        assert_eq!(cfg.deep_window_ms, 30 * MINUTE_MS);
        assert_eq!(cfg.fresh_lookback_ms, 5 * MINUTE_MS);
        assert_eq!(cfg.deep_window_minutes(), 30);
        assert!(!cfg.fresh_signals_enabled);
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("TELEGRAM_CHAT_ID", "42")])).unwrap_err();
        assert!(matches!(err, AppError::MissingSetting("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn feed_urls_are_split_and_trimmed() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("FEED_URLS", "wss://a , ,wss://b"),
            ("FRESH_SIGNALS_ENABLED", "true"),
        ]))
        .unwrap();

        assert_eq!(cfg.feed_urls, vec!["wss://a".to_string(), "wss://b".to_string()]);
        assert!(cfg.fresh_signals_enabled);
    }

    #[test]
    fn unparseable_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("BATCH_INTERVAL_SECS", "soon"),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidSetting { key: "BATCH_INTERVAL_SECS", .. }
        ));
    }

    #[test]
    fn zero_durations_are_rejected() {
        for key in ["BATCH_INTERVAL_SECS", "DEEP_WINDOW_SECS", "FRESH_LOOKBACK_SECS"] {
            let err = AppConfig::from_lookup(lookup(&[
                ("TELEGRAM_BOT_TOKEN", "t"),
                ("TELEGRAM_CHAT_ID", "42"),
                (key, "0"),
            ]))
            .unwrap_err();

            assert!(matches!(err, AppError::InvalidSetting { key: k, .. } if k == key));
        }
    }

    #[test]
    fn durations_overflowing_millis_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "42"),
            ("DEEP_WINDOW_SECS", "18446744073709551615"),
        ]))
        .unwrap_err();

        match err {
            AppError::InvalidSetting { key, value } => {
                assert_eq!(key, "DEEP_WINDOW_SECS");
                assert_eq!(value, "18446744073709551615");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

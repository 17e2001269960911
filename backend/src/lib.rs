pub mod batch;
pub mod config;
pub mod db;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod report;
pub mod signals;
pub mod snapshot;

pub mod error;
pub mod logger;
pub mod time;

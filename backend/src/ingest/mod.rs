pub mod dedup;
pub mod ingestor;

pub use dedup::DedupCache;
pub use ingestor::{FreshReporter, IngestStats, Ingestor};

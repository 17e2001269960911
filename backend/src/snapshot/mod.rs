//! Snapshot model and the time-series store behind the detectors.

pub mod model;
pub mod repository;
pub mod repository_sqlx;

pub use model::{FeedContext, Snapshot};
pub use repository::SnapshotRepository;
pub use repository_sqlx::SqlxSnapshotRepository;

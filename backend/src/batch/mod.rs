pub mod driver;

pub use driver::{BatchDriver, BatchSummary, Evaluation, PairSignals};

use thiserror::Error;

/// Failures of the snapshot store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid snapshot row: {0}")]
    InvalidRow(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),
}

/// Startup-time configuration failures.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    #[error("invalid value for {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
}

use thiserror::Error;

/// Error type that captures common tracker failures.
///
/// `Validation` is rejected before any state change and is recoverable by
/// correcting the input. `Consistency` reports aggregate drift without fixing
/// it. Storage failures are propagated unmodified; the core never retries.
#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Consistency error: {0}")]
    Consistency(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed block {index}: {reason}")]
    MalformedBlock { index: u64, reason: String },
}

use crate::history::{FetchError, RangeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to fetch position history: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid time range: {0}")]
    InvalidRange(#[from] RangeError),
    #[error("replay controller requires a running tokio runtime")]
    NoRuntime,
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
}

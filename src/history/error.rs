use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure while retrieving position history
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("history request failed with HTTP status {status}")]
    Http { status: u16 },
    #[error("not authorized to read device history")]
    Unauthorized,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed history payload: {0}")]
    Format(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Rejected time range or period
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("range start {from} is after end {to}")]
    Inverted { from: DateTime<Utc>, to: DateTime<Utc> },
    #[error("period falls outside the supported calendar")]
    OutOfCalendar,
    #[error("unknown period '{0}'")]
    UnknownPeriod(String),
}

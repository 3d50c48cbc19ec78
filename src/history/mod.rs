pub mod error;
pub mod file;
pub mod mock;
pub mod period;

pub use error::{FetchError, RangeError};
pub use file::FileHistory;
pub use mock::MockHistory;
pub use period::Period;

use async_trait::async_trait;
use crate::core::Position;
use chrono::{DateTime, Utc};

/// Upper bound on positions returned by a single history request
pub const DEFAULT_HISTORY_LIMIT: usize = 5000;

/// Result type for history operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Inclusive time range `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Check whether a timestamp falls inside the range (both ends inclusive)
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.from <= time && time <= self.to
    }
}

/// A request for one device's position history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub device_id: i64,
    pub range: TimeRange,
    /// Maximum number of positions to return
    pub limit: usize,
}

impl HistoryQuery {
    pub fn new(device_id: i64, range: TimeRange) -> Self {
        Self {
            device_id,
            range,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Source of historical positions
///
/// Implementations:
/// - `FileHistory` serving an exported CSV/JSON file
/// - `MockHistory` with scripted responses for testing
///
/// Results must be ascending by server time and hold at most `query.limit`
/// positions. Implementations never retry on their own.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &str;

    /// Retrieve the positions matching a query
    async fn fetch(&self, query: &HistoryQuery) -> FetchResult<Vec<Position>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert!(TimeRange::new(t, t).is_ok());
        assert_eq!(
            TimeRange::new(t, t - Duration::seconds(1)),
            Err(RangeError::Inverted { from: t, to: t - Duration::seconds(1) })
        );
    }

    #[test]
    fn test_range_is_inclusive() {
        let from = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let to = from + Duration::hours(1);
        let range = TimeRange::new(from, to).unwrap();
        assert!(range.contains(from));
        assert!(range.contains(to));
        assert!(!range.contains(to + Duration::milliseconds(1)));
    }

    #[test]
    fn test_query_default_limit() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let query = HistoryQuery::new(4, TimeRange::new(t, t).unwrap());
        assert_eq!(query.limit, 5000);
        assert_eq!(query.with_limit(10).limit, 10);
    }
}

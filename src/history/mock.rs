use async_trait::async_trait;
use crate::core::Position;
use crate::history::{FetchError, FetchResult, HistoryQuery, HistorySource};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply
struct Scripted {
    delay: Duration,
    result: FetchResult<Vec<Position>>,
}

/// Mock history source for testing without a backend
///
/// Replies are consumed in the order they were scripted. Once the script runs
/// dry every request succeeds with an empty history.
#[derive(Default)]
pub struct MockHistory {
    script: Mutex<VecDeque<Scripted>>,
    queries: Mutex<Vec<HistoryQuery>>,
}

impl MockHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn push_positions(&self, positions: Vec<Position>) {
        self.push(Duration::ZERO, Ok(positions));
    }

    /// Queue a failing reply
    pub fn push_error(&self, error: FetchError) {
        self.push(Duration::ZERO, Err(error));
    }

    /// Queue a reply that only completes after `delay`
    pub fn push_delayed(&self, delay: Duration, result: FetchResult<Vec<Position>>) {
        self.push(delay, result);
    }

    fn push(&self, delay: Duration, result: FetchResult<Vec<Position>>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted { delay, result });
    }

    /// All queries received so far (for verification)
    pub fn queries(&self) -> Vec<HistoryQuery> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl HistorySource for MockHistory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, query: &HistoryQuery) -> FetchResult<Vec<Position>> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.clone());

        let next = self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front();

        match next {
            Some(Scripted { delay, result }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::TimeRange;
    use chrono::{TimeZone, Utc};

    fn query(device_id: i64) -> HistoryQuery {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        HistoryQuery::new(device_id, TimeRange::new(t, t).unwrap())
    }

    #[tokio::test]
    async fn test_mock_replies_in_order() {
        let mock = MockHistory::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        mock.push_positions(vec![Position::new(1, 1, t, 0.0, 0.0)]);
        mock.push_error(FetchError::Http { status: 503 });

        assert_eq!(mock.fetch(&query(1)).await.unwrap().len(), 1);
        assert!(matches!(
            mock.fetch(&query(2)).await,
            Err(FetchError::Http { status: 503 })
        ));
        // Script exhausted
        assert!(mock.fetch(&query(3)).await.unwrap().is_empty());

        let devices: Vec<i64> = mock.queries().iter().map(|q| q.device_id).collect();
        assert_eq!(devices, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_delay() {
        let mock = MockHistory::new();
        mock.push_delayed(Duration::from_secs(2), Ok(Vec::new()));

        let start = tokio::time::Instant::now();
        mock.fetch(&query(1)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}

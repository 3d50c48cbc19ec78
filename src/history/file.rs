use async_trait::async_trait;
use crate::core::Position;
use crate::history::{FetchResult, HistoryQuery, HistorySource};
use crate::input::load_file;
use std::path::Path;
use tracing::{debug, info};

/// History source backed by an exported position file
///
/// The file is read once; every query is answered from memory.
pub struct FileHistory {
    name: String,
    positions: Vec<Position>,
}

impl FileHistory {
    /// Load a CSV or JSON position export
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let positions = load_file(path)?;
        info!("Loaded {} positions from {}", positions.len(), path.display());
        Ok(Self::from_positions(path.display().to_string(), positions))
    }

    /// Serve an in-memory set of positions
    pub fn from_positions(name: impl Into<String>, mut positions: Vec<Position>) -> Self {
        positions.sort_by_key(|p| p.server_time);
        Self {
            name: name.into(),
            positions,
        }
    }

    /// Device ids present in the file
    pub fn devices(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.positions.iter().map(|p| p.device_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[async_trait]
impl HistorySource for FileHistory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &HistoryQuery) -> FetchResult<Vec<Position>> {
        let result: Vec<Position> = self
            .positions
            .iter()
            .filter(|p| p.device_id == query.device_id && query.range.contains(p.server_time))
            .take(query.limit)
            .cloned()
            .collect();

        debug!(
            "{}: device {} [{} .. {}] -> {} positions",
            self.name,
            query.device_id,
            query.range.from(),
            query.range.to(),
            result.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::TimeRange;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn history() -> FileHistory {
        // Deliberately out of order
        FileHistory::from_positions(
            "test",
            vec![
                Position::new(3, 1, t(20), 0.0, 0.2),
                Position::new(1, 1, t(0), 0.0, 0.0),
                Position::new(9, 2, t(5), 1.0, 1.0),
                Position::new(2, 1, t(10), 0.0, 0.1),
                Position::new(4, 1, t(30), 0.0, 0.3),
            ],
        )
    }

    #[tokio::test]
    async fn test_filters_by_device_and_inclusive_range() {
        let history = history();
        let query = HistoryQuery::new(1, TimeRange::new(t(10), t(30)).unwrap());
        let ids: Vec<i64> = history.fetch(&query).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_applies_limit_to_earliest_positions() {
        let history = history();
        let query = HistoryQuery::new(1, TimeRange::new(t(0), t(60)).unwrap()).with_limit(2);
        let ids: Vec<i64> = history.fetch(&query).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unknown_device_is_empty_not_error() {
        let history = history();
        let query = HistoryQuery::new(42, TimeRange::new(t(0), t(60)).unwrap());
        assert!(history.fetch(&query).await.unwrap().is_empty());
    }

    #[test]
    fn test_devices() {
        assert_eq!(history().devices(), vec![1, 2]);
        assert_eq!(history().len(), 5);
    }

    #[test]
    fn test_open_csv_file() {
        let path = std::env::temp_dir().join(format!("fleet-replay-history-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "id,deviceId,serverTime,latitude,longitude\n1,5,2024-05-01T08:00:00Z,1.0,2.0\n",
        )
        .unwrap();

        let history = FileHistory::open(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(history.devices(), vec![5]);
        assert!(!history.is_empty());
    }
}

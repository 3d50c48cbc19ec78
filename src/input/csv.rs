use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use crate::core::Position;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Load positions from a CSV export
///
/// Columns are matched case-insensitively against common aliases:
/// - serverTime / server_time / time / timestamp (required)
/// - latitude / lat and longitude / lon / lng (required)
/// - id, deviceId, deviceTime, fixTime, speed, course, altitude,
///   accuracy, valid, protocol (optional)
///
/// Any other column is kept as a string attribute.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Position>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    parse_csv(file)
}

/// Parse positions from any CSV reader
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Position>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = Columns::detect(&headers)?;

    let mut positions = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.context("Failed to read CSV row")?;
        let line = row + 2;

        let server_time = record
            .get(columns.server_time)
            .context("Missing server time")
            .and_then(parse_time)
            .with_context(|| format!("Bad server time on line {}", line))?;

        let latitude = parse_f64(&record, columns.latitude)
            .with_context(|| format!("Bad latitude on line {}", line))?;
        let longitude = parse_f64(&record, columns.longitude)
            .with_context(|| format!("Bad longitude on line {}", line))?;

        let mut position = Position::new(
            optional(&record, columns.id)
                .and_then(|s| s.parse().ok())
                .unwrap_or(row as i64 + 1),
            optional(&record, columns.device_id)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            server_time,
            latitude,
            longitude,
        );

        position.device_time = optional(&record, columns.device_time).and_then(|s| parse_time(s).ok());
        position.fix_time = optional(&record, columns.fix_time).and_then(|s| parse_time(s).ok());
        position.speed = optional(&record, columns.speed).and_then(|s| s.parse().ok());
        position.course = optional(&record, columns.course).and_then(|s| s.parse().ok());
        position.altitude = optional(&record, columns.altitude).and_then(|s| s.parse().ok());
        position.accuracy = optional(&record, columns.accuracy).and_then(|s| s.parse().ok());
        position.valid = optional(&record, columns.valid).map_or(true, parse_bool);
        position.protocol = optional(&record, columns.protocol).unwrap_or_default().to_string();

        let mut attributes = BTreeMap::new();
        for &idx in &columns.extra {
            if let (Some(name), Some(value)) = (headers.get(idx), optional(&record, Some(idx))) {
                attributes.insert(name.to_string(), serde_json::Value::String(value.to_string()));
            }
        }
        position.attributes = attributes;

        positions.push(position);
    }

    Ok(positions)
}

/// Resolved column indices
struct Columns {
    id: Option<usize>,
    device_id: Option<usize>,
    server_time: usize,
    device_time: Option<usize>,
    fix_time: Option<usize>,
    latitude: usize,
    longitude: usize,
    speed: Option<usize>,
    course: Option<usize>,
    altitude: Option<usize>,
    accuracy: Option<usize>,
    valid: Option<usize>,
    protocol: Option<usize>,
    extra: Vec<usize>,
}

impl Columns {
    fn detect(headers: &csv::StringRecord) -> Result<Self> {
        let mut columns = Self {
            id: find_column(headers, &["id", "positionid", "position_id"]),
            device_id: find_column(headers, &["deviceid", "device_id", "device"]),
            server_time: find_column(headers, &["servertime", "server_time", "time", "timestamp"])
                .context("Could not find a server time column")?,
            device_time: find_column(headers, &["devicetime", "device_time"]),
            fix_time: find_column(headers, &["fixtime", "fix_time"]),
            latitude: find_column(headers, &["latitude", "lat"])
                .context("Could not find a latitude column")?,
            longitude: find_column(headers, &["longitude", "lon", "lng"])
                .context("Could not find a longitude column")?,
            speed: find_column(headers, &["speed"]),
            course: find_column(headers, &["course", "heading"]),
            altitude: find_column(headers, &["altitude", "alt"]),
            accuracy: find_column(headers, &["accuracy"]),
            valid: find_column(headers, &["valid"]),
            protocol: find_column(headers, &["protocol"]),
            extra: Vec::new(),
        };

        let known = [
            columns.id,
            columns.device_id,
            Some(columns.server_time),
            columns.device_time,
            columns.fix_time,
            Some(columns.latitude),
            Some(columns.longitude),
            columns.speed,
            columns.course,
            columns.altitude,
            columns.accuracy,
            columns.valid,
            columns.protocol,
        ];
        columns.extra = (0..headers.len())
            .filter(|idx| !known.contains(&Some(*idx)))
            .collect();

        Ok(columns)
    }
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header_lower = header.trim().to_lowercase();
        names.iter().any(|&name| header_lower == name)
    })
}

fn optional(record: &csv::StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_f64(record: &csv::StringRecord, idx: usize) -> Result<f64> {
    let raw = record.get(idx).map(str::trim).unwrap_or_default();
    raw.parse::<f64>()
        .map_err(|e| anyhow::anyhow!("'{}': {}", raw, e))
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Parse an RFC 3339 timestamp, or a naive "YYYY-MM-DD HH:MM:SS" taken as UTC
pub fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| anyhow::anyhow!("Invalid timestamp '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_time_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_time("2024-05-01T08:00:00Z").unwrap(), expected);
        assert_eq!(parse_time("2024-05-01T10:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_time("2024-05-01 08:00:00").unwrap(), expected);
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn test_parse_csv_with_aliases_and_attributes() {
        let data = "\
ID,Device,Time,Lat,Lng,Speed,Valid,Protocol,ignition
10,3,2024-05-01T08:00:00Z,48.85,2.35,12.5,true,osmand,on
11,3,2024-05-01T08:00:05Z,48.86,2.36,,false,osmand,
";
        let positions = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(positions.len(), 2);

        assert_eq!(positions[0].id, 10);
        assert_eq!(positions[0].device_id, 3);
        assert_eq!(positions[0].speed, Some(12.5));
        assert!(positions[0].valid);
        assert_eq!(positions[0].protocol, "osmand");
        assert_eq!(
            positions[0].attributes.get("ignition"),
            Some(&serde_json::Value::String("on".to_string()))
        );

        assert_eq!(positions[1].speed, None);
        assert!(!positions[1].valid);
        assert!(positions[1].attributes.is_empty());
    }

    #[test]
    fn test_parse_csv_defaults_missing_ids() {
        let data = "serverTime,latitude,longitude\n2024-05-01T08:00:00Z,1.0,2.0\n2024-05-01T08:00:01Z,1.0,2.0\n";
        let positions = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(positions[0].id, 1);
        assert_eq!(positions[1].id, 2);
        assert_eq!(positions[1].device_id, 0);
    }

    #[test]
    fn test_parse_csv_requires_coordinates() {
        let data = "serverTime,latitude\n2024-05-01T08:00:00Z,1.0\n";
        assert!(parse_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_csv_reports_bad_line() {
        let data = "serverTime,latitude,longitude\n2024-05-01T08:00:00Z,north,2.0\n";
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}

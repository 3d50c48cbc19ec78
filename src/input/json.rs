use anyhow::{Context, Result};
use std::path::Path;
use crate::core::Position;

/// Load positions from a JSON array as returned by the positions endpoint
pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<Position>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_json(&text)
}

/// Parse a JSON array of positions
pub fn parse_json(text: &str) -> Result<Vec<Position>> {
    serde_json::from_str(text).context("Failed to parse position array")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let text = r#"[
            {"id": 1, "deviceId": 3, "serverTime": "2024-05-01T08:00:00Z", "latitude": 1.0, "longitude": 2.0},
            {"id": 2, "deviceId": 3, "serverTime": "2024-05-01T08:00:10Z", "latitude": 1.1, "longitude": 2.1, "speed": 5.5}
        ]"#;

        let positions = parse_json(text).unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[1].speed, Some(5.5));
        assert!(!positions[0].valid);
    }

    #[test]
    fn test_parse_json_rejects_missing_coordinates() {
        let text = r#"[{"id": 1, "deviceId": 3, "serverTime": "2024-05-01T08:00:00Z"}]"#;
        assert!(parse_json(text).is_err());
    }
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A single GPS fix reported by a tracked device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Opaque position identifier
    pub id: i64,

    /// Device that reported this fix
    pub device_id: i64,

    /// Time the server received the fix (authoritative ordering key)
    pub server_time: DateTime<Utc>,

    /// Time reported by the device clock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_time: Option<DateTime<Utc>>,

    /// Time of the satellite fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_time: Option<DateTime<Utc>>,

    pub latitude: f64,
    pub longitude: f64,

    /// Speed in knots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Heading in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,

    /// Altitude in metres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Horizontal accuracy in metres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    /// Fix quality flag
    #[serde(default)]
    pub valid: bool,

    /// Transport protocol the fix arrived on
    #[serde(default)]
    pub protocol: String,

    /// Protocol specific extras
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Position {
    /// Create a minimal valid position
    pub fn new(id: i64, device_id: i64, server_time: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            device_id,
            server_time,
            device_time: None,
            fix_time: None,
            latitude,
            longitude,
            speed: None,
            course: None,
            altitude: None,
            accuracy: None,
            valid: true,
            protocol: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Fix time when the device reported one, server time otherwise
    pub fn fix_or_server_time(&self) -> DateTime<Utc> {
        self.fix_time.unwrap_or(self.server_time)
    }

    /// Great-circle distance to another position in metres
    pub fn distance_to(&self, other: &Position) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// Speed converted from knots to km/h
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed.map(|knots| knots * 1.852)
    }
}

use crate::core::Position;
use chrono::Duration;
use std::fmt;

/// Summary of a travelled route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStats {
    /// Number of fixes in the route
    pub points: usize,
    /// Sum of great-circle legs in metres
    pub distance_m: f64,
    /// Highest reported speed in knots
    pub max_speed: Option<f64>,
    /// Time between the first and last fix
    pub duration: Duration,
}

impl Default for RouteStats {
    fn default() -> Self {
        Self {
            points: 0,
            distance_m: 0.0,
            max_speed: None,
            duration: Duration::zero(),
        }
    }
}

impl RouteStats {
    /// Compute statistics over an ordered slice of positions
    pub fn from_positions(positions: &[Position]) -> Self {
        let distance_m: f64 = positions
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum();

        let max_speed = positions
            .iter()
            .filter_map(|p| p.speed)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.max(s))));

        let duration = match (positions.first(), positions.last()) {
            (Some(first), Some(last)) => last.server_time - first.server_time,
            _ => Duration::zero(),
        };

        Self {
            points: positions.len(),
            distance_m,
            max_speed,
            duration,
        }
    }

    /// Distance in kilometres
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

impl fmt::Display for RouteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.duration.num_seconds().max(0);
        write!(
            f,
            "{:.2} km in {}h{:02}m{:02}s",
            self.distance_km(),
            secs / 3600,
            secs % 3600 / 60,
            secs % 60
        )?;
        match self.max_speed {
            // Knots to km/h
            Some(knots) => write!(f, ", max {:.1} km/h", knots * 1.852),
            None => Ok(()),
        }
    }
}

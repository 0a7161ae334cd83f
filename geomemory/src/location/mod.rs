//! Position fix value type.
//!
//! A [`Location`] is a single position report from the sensor collaborator.
//! It is immutable once produced; the coordinator retains only the most
//! recent one as the last known location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Estimated horizontal accuracy radius in meters.
    pub horizontal_accuracy_m: f64,
    /// When the fix was produced.
    pub timestamp: DateTime<Utc>,
}

impl Location {
    /// Create a fix stamped with the current time.
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy_m,
            timestamp: Utc::now(),
        }
    }

    /// Create a fix with an explicit timestamp (for replay and testing).
    pub fn with_timestamp(
        latitude: f64,
        longitude: f64,
        horizontal_accuracy_m: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy_m,
            timestamp,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.5}, {:.5}) ±{:.0}m @ {}",
            self.latitude, self.longitude, self.horizontal_accuracy_m, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_stamps_current_time() {
        let before = Utc::now();
        let fix = Location::new(40.0, -73.9, 10.0);
        let after = Utc::now();

        assert!(fix.timestamp >= before && fix.timestamp <= after);
    }

    #[test]
    fn test_with_timestamp_preserves_timestamp() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let fix = Location::with_timestamp(40.0, -73.9, 10.0, ts);
        assert_eq!(fix.timestamp, ts);
    }

    #[test]
    fn test_display_includes_coordinates() {
        let fix = Location::new(40.7128, -74.006, 25.0);
        let text = format!("{}", fix);
        assert!(text.contains("40.71280"));
        assert!(text.contains("-74.00600"));
    }
}

//! Accuracy/power profiles keyed by semantic activity tags.
//!
//! Callers describe what the user is doing ("fitness", "automotive") and the
//! coordinator maps that to a concrete accuracy/distance-filter profile for
//! the sensor. Unrecognized tags fall back to the default profile rather
//! than failing — accuracy tuning is advisory, never an error.

use serde::{Deserialize, Serialize};

/// Semantic activity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    /// General use; the default profile.
    Other,
    /// Walking, running, cycling — tight accuracy, small movements matter.
    Fitness,
    /// Road navigation — high accuracy but coarser distance filtering.
    Automotive,
    /// Flight — positions change fast, fine accuracy is wasted power.
    Airborne,
}

impl ActivityType {
    /// Resolve a caller-supplied tag.
    ///
    /// Matching is case-insensitive; anything unrecognized maps to
    /// [`ActivityType::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "fitness" => Self::Fitness,
            "automotive" => Self::Automotive,
            "airborne" => Self::Airborne,
            _ => Self::Other,
        }
    }

    /// The accuracy/power profile for this activity.
    pub fn profile(self) -> AccuracyProfile {
        match self {
            Self::Other => AccuracyProfile {
                desired_accuracy_m: 100.0,
                distance_filter_m: 50.0,
            },
            Self::Fitness => AccuracyProfile {
                desired_accuracy_m: 10.0,
                distance_filter_m: 5.0,
            },
            Self::Automotive => AccuracyProfile {
                desired_accuracy_m: 10.0,
                distance_filter_m: 25.0,
            },
            Self::Airborne => AccuracyProfile {
                desired_accuracy_m: 1000.0,
                distance_filter_m: 500.0,
            },
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Other => "other",
            Self::Fitness => "fitness",
            Self::Automotive => "automotive",
            Self::Airborne => "airborne",
        };
        f.write_str(name)
    }
}

/// A concrete accuracy/power trade-off pushed to the sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyProfile {
    /// Requested horizontal accuracy in meters.
    pub desired_accuracy_m: f64,
    /// Minimum movement before the sensor reports a new fix, in meters.
    pub distance_filter_m: f64,
}

impl Default for AccuracyProfile {
    fn default() -> Self {
        ActivityType::Other.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_known_values() {
        assert_eq!(ActivityType::from_tag("fitness"), ActivityType::Fitness);
        assert_eq!(
            ActivityType::from_tag("automotive"),
            ActivityType::Automotive
        );
        assert_eq!(ActivityType::from_tag("airborne"), ActivityType::Airborne);
        assert_eq!(ActivityType::from_tag("other"), ActivityType::Other);
    }

    #[test]
    fn test_from_tag_is_case_insensitive() {
        assert_eq!(ActivityType::from_tag("Fitness"), ActivityType::Fitness);
        assert_eq!(
            ActivityType::from_tag("  AUTOMOTIVE "),
            ActivityType::Automotive
        );
    }

    #[test]
    fn test_from_tag_falls_back_to_other() {
        assert_eq!(ActivityType::from_tag("submarine"), ActivityType::Other);
        assert_eq!(ActivityType::from_tag(""), ActivityType::Other);
    }

    #[test]
    fn test_fitness_profile_is_tighter_than_default() {
        let fitness = ActivityType::Fitness.profile();
        let other = ActivityType::Other.profile();
        assert!(fitness.desired_accuracy_m < other.desired_accuracy_m);
        assert!(fitness.distance_filter_m < other.distance_filter_m);
    }

    #[test]
    fn test_default_profile_matches_other() {
        assert_eq!(AccuracyProfile::default(), ActivityType::Other.profile());
    }
}

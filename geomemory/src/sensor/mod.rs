//! The positioning-sensor collaborator boundary.
//!
//! The engine does not own positioning hardware. It issues commands through
//! the [`PositioningSensor`] trait and receives asynchronous callbacks as
//! [`SensorEvent`] messages on a channel, each processed as a discrete task
//! under the coordinator's exclusive section.
//!
//! # Contract
//!
//! - Commands are non-blocking: they enqueue work on the sensor's own
//!   execution context and return immediately.
//! - Callbacks arrive in the order the sensor produced them.
//! - Monitoring a region identifier the sensor already monitors replaces the
//!   prior registration; there is never transient double-monitoring.
//!
//! The [`SimulatedSensor`] implementation drives the engine in tests and the
//! demo CLI.

mod simulated;

pub use simulated::{SensorCommand, SimulatedSensor};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accuracy::AccuracyProfile;
use crate::auth::{AuthorizationStatus, PermissionLevel};
use crate::location::Location;
use crate::region::Region;

/// What the underlying platform supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorCapabilities {
    /// Geofence (region enter/exit) monitoring.
    pub region_monitoring: bool,
    /// Low-power significant-change location updates.
    pub significant_change: bool,
    /// Beacon-scale proximity ranging.
    pub ranging: bool,
}

impl SensorCapabilities {
    /// Everything supported.
    pub fn full() -> Self {
        Self {
            region_monitoring: true,
            significant_change: true,
            ranging: true,
        }
    }
}

impl Default for SensorCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// A failure reported by the sensor collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct SensorFailure {
    /// Human-readable description from the platform layer.
    pub message: String,
}

impl SensorFailure {
    /// Create a failure with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An asynchronous callback from the sensor collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A raw position fix.
    PositionFix(Location),
    /// The device entered a monitored region.
    RegionEntered {
        /// Identifier of the crossed region.
        identifier: String,
    },
    /// The device left a monitored region.
    RegionExited {
        /// Identifier of the crossed region.
        identifier: String,
    },
    /// The authorization status changed (prompt answered, Settings toggled).
    AuthorizationChanged(AuthorizationStatus),
    /// The sensor failed.
    Failure(SensorFailure),
}

/// Commands the engine issues to the positioning hardware abstraction.
///
/// All methods are non-blocking. Failures surface asynchronously as
/// [`SensorEvent::Failure`] callbacks, except region registration which can
/// be refused synchronously.
pub trait PositioningSensor: Send + Sync {
    /// What the platform supports. Stable for the sensor's lifetime.
    fn capabilities(&self) -> SensorCapabilities;

    /// Show the permission prompt for the given level.
    ///
    /// The outcome arrives later as
    /// [`SensorEvent::AuthorizationChanged`]; the platform may skip the
    /// prompt entirely if the user already decided.
    fn request_permission(&self, level: PermissionLevel);

    /// Apply an accuracy/power profile.
    fn set_accuracy(&self, profile: AccuracyProfile);

    /// Begin continuous position updates.
    fn start_updates(&self);

    /// Stop continuous position updates.
    fn stop_updates(&self);

    /// Begin low-power significant-change updates.
    fn start_significant_change_updates(&self);

    /// Stop significant-change updates.
    fn stop_significant_change_updates(&self);

    /// Register a region for enter/exit monitoring.
    ///
    /// Re-registering an identifier replaces the prior registration.
    fn start_region_monitoring(&self, region: &Region) -> Result<(), SensorFailure>;

    /// Deregister a region. Unknown identifiers are a no-op.
    fn stop_region_monitoring(&self, identifier: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_default_is_full() {
        let caps = SensorCapabilities::default();
        assert!(caps.region_monitoring);
        assert!(caps.significant_change);
        assert!(caps.ranging);
    }

    #[test]
    fn test_sensor_failure_display() {
        let failure = SensorFailure::new("radio offline");
        assert_eq!(failure.to_string(), "radio offline");
    }
}

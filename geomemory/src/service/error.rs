//! Failure kinds for coordination operations.

use serde::Serialize;
use thiserror::Error;

use crate::auth::{AuthorizationStatus, PermissionLevel};
use crate::region::{InvalidRegion, RegistryError};
use crate::sensor::SensorFailure;

/// A platform capability an operation may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Capability {
    /// Geofence enter/exit monitoring.
    RegionMonitoring,
    /// Low-power significant-change updates.
    SignificantChange,
    /// Beacon-scale proximity ranging.
    Ranging,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RegionMonitoring => "region monitoring",
            Self::SignificantChange => "significant-change monitoring",
            Self::Ranging => "ranging",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the coordination engine.
///
/// Failed operations leave all state unchanged; nothing here is fatal to the
/// process. Sensor-reported failures additionally surface once as a
/// `MonitoringFailed` event.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum LocationError {
    /// The operation needs more permission than the user granted.
    #[error("operation requires {required} authorization, current status is {current}")]
    Unauthorized {
        /// The level the operation needs.
        required: PermissionLevel,
        /// The status at the time of the call.
        current: AuthorizationStatus,
    },

    /// The platform lacks a required capability.
    #[error("platform does not support {0}")]
    CapabilityUnavailable(Capability),

    /// The monitored-region limit is reached.
    #[error("region capacity of {limit} reached")]
    CapacityExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// A caller-supplied parameter is invalid.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Permission was downgraded while location updates were active.
    #[error("authorization revoked while location updates were active (now {status})")]
    AuthorizationRevoked {
        /// The status after the downgrade.
        status: AuthorizationStatus,
    },

    /// The sensor collaborator reported a failure.
    #[error("sensor failure: {0}")]
    Sensor(#[from] SensorFailure),
}

impl From<InvalidRegion> for LocationError {
    fn from(err: InvalidRegion) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}

impl From<RegistryError> for LocationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::CapacityExceeded { limit } => Self::CapacityExceeded { limit },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_display() {
        let err = LocationError::Unauthorized {
            required: PermissionLevel::WhenInUse,
            current: AuthorizationStatus::Denied,
        };
        let text = err.to_string();
        assert!(text.contains("when-in-use"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn test_invalid_region_maps_to_invalid_parameter() {
        let invalid = crate::region::Region::circular("kitchen", 40.0, -73.9, -1.0).unwrap_err();
        let err: LocationError = invalid.into();
        assert!(matches!(err, LocationError::InvalidParameter(_)));
    }

    #[test]
    fn test_registry_error_maps_to_capacity() {
        let err: LocationError = RegistryError::CapacityExceeded { limit: 20 }.into();
        assert_eq!(err, LocationError::CapacityExceeded { limit: 20 });
    }

    #[test]
    fn test_sensor_failure_passes_through() {
        let err: LocationError = SensorFailure::new("radio offline").into();
        assert!(err.to_string().contains("radio offline"));
    }
}

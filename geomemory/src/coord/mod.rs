//! Geographic coordinate validation and distance math.
//!
//! Provides the latitude/longitude range checks used when regions and fixes
//! enter the system, and the great-circle distance used to decide whether a
//! point falls inside a circular region.

use std::f64::consts::PI;

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Mean Earth radius in meters (IUGG value).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Errors produced by coordinate validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude outside the valid -90..=90 range, or not finite.
    #[error("invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside the valid -180..=180 range, or not finite.
    #[error("invalid longitude: {0}")]
    InvalidLongitude(f64),
}

/// Validates a latitude/longitude pair.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-90.0 to 90.0)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
///
/// # Returns
///
/// `Ok(())` if both values are finite and in range, otherwise the first
/// offending coordinate as a `CoordError`.
pub fn validate_lat_lon(lat: f64, lon: f64) -> Result<(), CoordError> {
    if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    Ok(())
}

/// Great-circle distance between two points in meters (haversine formula).
///
/// Accurate to well under a meter at geofence scale, which is all the
/// containment check needs. Inputs are assumed validated.
#[inline]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let to_rad = PI / 180.0;
    let dlat = (lat2 - lat1) * to_rad;
    let dlon = (lon2 - lon1) * to_rad;

    let a = (dlat / 2.0).sin().powi(2)
        + (lat1 * to_rad).cos() * (lat2 * to_rad).cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

//! Region and memory-geofence value types.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{self, CoordError};

/// Maximum accepted identifier length in characters.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// Reasons a region definition is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidRegion {
    /// Identifier is empty, too long, or contains control characters or
    /// leading/trailing whitespace.
    #[error("malformed region identifier {0:?}")]
    Identifier(String),

    /// Center coordinates out of range or not finite.
    #[error(transparent)]
    Coordinates(#[from] CoordError),

    /// Radius must be a positive, finite number of meters.
    #[error("region radius must be positive and finite, got {0}")]
    Radius(f64),
}

/// Identifier format: no control characters, no leading/trailing whitespace.
///
/// Identifiers are opaque application strings ("kitchen", "home:door"), so
/// the rule is deliberately permissive; it only rejects strings that cannot
/// round-trip through logs and storage keys cleanly.
fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // \S          - first character is not whitespace
        // [^\x00-\x1F]* - interior allows anything printable
        // \S          - last character is not whitespace
        Regex::new(r"^\S(?:[^\x00-\x1F]*\S)?$").unwrap()
    })
}

/// Validates a region/memory identifier.
pub fn validate_identifier(identifier: &str) -> Result<(), InvalidRegion> {
    if identifier.chars().count() > MAX_IDENTIFIER_LEN
        || !identifier_pattern().is_match(identifier)
    {
        return Err(InvalidRegion::Identifier(identifier.to_string()));
    }
    Ok(())
}

/// A circular monitored region.
///
/// Identity is the identifier string; two regions with the same identifier
/// are the same region as far as monitoring is concerned. The geometry is
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    identifier: String,
    center_latitude: f64,
    center_longitude: f64,
    radius_m: f64,
}

impl Region {
    /// Create a circular region, validating identifier, center, and radius.
    pub fn circular(
        identifier: impl Into<String>,
        center_latitude: f64,
        center_longitude: f64,
        radius_m: f64,
    ) -> Result<Self, InvalidRegion> {
        let identifier = identifier.into();
        validate_identifier(&identifier)?;
        coord::validate_lat_lon(center_latitude, center_longitude)?;
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(InvalidRegion::Radius(radius_m));
        }
        Ok(Self {
            identifier,
            center_latitude,
            center_longitude,
            radius_m,
        })
    }

    /// The opaque identifier naming this region.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Center as a (latitude, longitude) pair in degrees.
    pub fn center(&self) -> (f64, f64) {
        (self.center_latitude, self.center_longitude)
    }

    /// Radius in meters.
    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Whether the given point falls inside this region.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        coord::distance_meters(
            self.center_latitude,
            self.center_longitude,
            latitude,
            longitude,
        ) <= self.radius_m
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.5}, {:.5}) r={:.0}m",
            self.identifier, self.center_latitude, self.center_longitude, self.radius_m
        )
    }
}

/// Spatial-memory attributes attached to a monitored region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryAttributes {
    /// When the geofence stops being monitored; `None` means never.
    pub expires_at: Option<DateTime<Utc>>,
}

impl MemoryAttributes {
    /// Whether the attributes mark the geofence expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }
}

/// A region tagged as a piece of spatial memory.
///
/// One-to-one with a monitored [`Region`], sharing its identifier: the memory
/// identifier *is* the region identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryGeofence {
    /// The monitored region.
    pub region: Region,
    /// Memory attributes (expiration).
    pub attributes: MemoryAttributes,
}

impl MemoryGeofence {
    /// Create a memory geofence over a validated region.
    pub fn new(region: Region, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            region,
            attributes: MemoryAttributes { expires_at },
        }
    }

    /// The application-defined memory identifier (same as the region's).
    pub fn memory_identifier(&self) -> &str {
        self.region.identifier()
    }

    /// Whether the geofence is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.attributes.is_expired_at(now)
    }
}

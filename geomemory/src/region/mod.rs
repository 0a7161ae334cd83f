//! Monitored regions and memory geofences.
//!
//! A [`Region`] is a circular geographic area identified by an opaque string.
//! A [`MemoryGeofence`] is a region carrying spatial-memory attributes
//! (optional expiration). The [`RegionRegistry`] is the insertion-ordered set
//! of regions currently under monitoring, enforcing the platform capacity
//! limit and identifier uniqueness.
//!
//! # Design Philosophy
//!
//! The registry stores facts and derives views. It performs no I/O and never
//! talks to the sensor collaborator; the coordinator orchestrates sensor
//! commands around registry mutations. This keeps every capacity, dedup, and
//! expiry rule testable as plain data manipulation.

mod model;
mod registry;

pub use model::{InvalidRegion, MemoryAttributes, MemoryGeofence, Region, MAX_IDENTIFIER_LEN};
pub use registry::{
    Presence, RegionEntry, RegionRegistry, RegistryError, DEFAULT_REGION_CAPACITY,
};

//! The coordination service and its surrounding plumbing.
//!
//! [`SpatialLocationService`] is the public face of the engine: permission
//! requests, start/stop of the update modes, accuracy configuration, region
//! and memory-geofence monitoring, and the read-only accessors. The
//! [`SensorEventLoop`] drains sensor callbacks into it;
//! [`crate::sweeper::ExpirationSweeper`] retires expired geofences on a
//! timer.

mod config;
mod coordinator;
mod error;
mod event_loop;

pub use config::ServiceConfig;
pub use coordinator::{SpatialLocationService, TrackingState, TrackingStatus};
pub use error::{Capability, LocationError};
pub use event_loop::SensorEventLoop;

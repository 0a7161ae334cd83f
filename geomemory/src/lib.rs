//! GeoMemory - Geofence and location coordination for spatial memory apps
//!
//! This library provides the core engine for applications that attach data to
//! geographic regions ("spatial memories") and need to be notified when the
//! device enters or leaves them, including across process restarts and with
//! per-region expiration.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides the coordinating
//! facade:
//!
//! ```ignore
//! use std::sync::Arc;
//! use geomemory::sensor::SimulatedSensor;
//! use geomemory::service::{SensorEventLoop, ServiceConfig, SpatialLocationService};
//!
//! let (sensor, events) = SimulatedSensor::new();
//! let service = Arc::new(SpatialLocationService::new(
//!     ServiceConfig::default(),
//!     sensor.clone(),
//! ));
//!
//! // Drain sensor callbacks as discrete events
//! let shutdown = tokio_util::sync::CancellationToken::new();
//! SensorEventLoop::new(Arc::clone(&service), events).spawn(shutdown.clone());
//!
//! // Monitor a memory geofence
//! service.start_monitoring_memory("kitchen", 40.0, -73.9, 50.0, None)?;
//! ```

pub mod accuracy;
pub mod auth;
pub mod coord;
pub mod events;
pub mod location;
pub mod logging;
pub mod region;
pub mod sensor;
pub mod service;
pub mod sweeper;

/// Version of the GeoMemory library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Sensor callback drain loop.
//!
//! Platform callbacks arrive on the sensor's own execution context. The
//! [`SensorEventLoop`] turns them into discrete tasks: it owns the receiving
//! end of the sensor's event channel and feeds each message through
//! [`SpatialLocationService::handle_sensor_event`], one at a time, until
//! cancelled or the channel closes.
//!
//! # Example
//!
//! ```ignore
//! let (sensor, events) = SimulatedSensor::new();
//! let service = Arc::new(SpatialLocationService::with_defaults(sensor.clone()));
//!
//! let shutdown = CancellationToken::new();
//! let handle = SensorEventLoop::new(Arc::clone(&service), events).spawn(shutdown.clone());
//!
//! // ... later
//! shutdown.cancel();
//! handle.await?;
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::sensor::SensorEvent;

use super::SpatialLocationService;

/// Long-running task draining sensor callbacks into the service.
pub struct SensorEventLoop {
    service: Arc<SpatialLocationService>,
    events: mpsc::UnboundedReceiver<SensorEvent>,
}

impl SensorEventLoop {
    /// Create a loop over the service and its sensor's event channel.
    pub fn new(
        service: Arc<SpatialLocationService>,
        events: mpsc::UnboundedReceiver<SensorEvent>,
    ) -> Self {
        Self { service, events }
    }

    /// Spawn the loop onto the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run until cancelled or the sensor drops its sender.
    pub async fn run(mut self, shutdown: CancellationToken) {
        debug!("sensor event loop started");
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("sensor event loop cancelled");
                    break;
                }

                event = self.events.recv() => match event {
                    Some(event) => self.service.handle_sensor_event(event),
                    None => {
                        debug!("sensor event channel closed");
                        break;
                    }
                }
            }
        }
    }
}

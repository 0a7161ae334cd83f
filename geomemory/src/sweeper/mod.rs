//! Expiration sweeping for memory geofences.
//!
//! A sweep walks the registered memory geofences and retires every one whose
//! expiration is at or before the current time: an exit notification is
//! emitted first (policy-dependent), then the region is removed and the
//! sensor told to stop monitoring it.
//!
//! Sweeps run on two cadences: inline after every handled sensor event, and
//! periodically via [`ExpirationSweeper`], a background daemon in the style
//! of the other long-running tasks in this workspace — a `tokio` interval
//! loop shut down through a [`CancellationToken`].
//!
//! Sweeping twice is safe; removal is idempotent. A cycle touches at most
//! the capacity-bounded registry, so it completes in bounded time and never
//! starves other operations.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::service::SpatialLocationService;

/// Default interval between periodic sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Whether an expiring geofence with unobserved presence gets an exit event.
///
/// The sensor is the source of truth for presence. When a geofence expires
/// before any crossing was observed, the engine does not know whether the
/// device is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpiryExitPolicy {
    /// Emit `RegionExited` only when the device was last observed inside.
    /// The default: no fabricated exits for regions the app was never told
    /// it entered.
    ObservedInsideOnly,
    /// Also emit `RegionExited` when presence was never observed. Regions
    /// last observed outside still emit nothing.
    AlwaysNotify,
}

/// Sweeping configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between periodic sweeps.
    pub interval: Duration,

    /// Exit-notification policy for unobserved presence.
    pub exit_policy: ExpiryExitPolicy,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            exit_policy: ExpiryExitPolicy::ObservedInsideOnly,
        }
    }
}

/// Periodic expiration sweep daemon.
///
/// # Example
///
/// ```ignore
/// let sweeper = ExpirationSweeper::new(Arc::clone(&service));
/// let handle = sweeper.spawn(shutdown.clone());
/// // ... later
/// shutdown.cancel();
/// handle.await?;
/// ```
pub struct ExpirationSweeper {
    service: Arc<SpatialLocationService>,
    interval: Duration,
}

impl ExpirationSweeper {
    /// Create a sweeper over the service, using its configured interval.
    pub fn new(service: Arc<SpatialLocationService>) -> Self {
        let interval = service.config().sweeper.interval;
        Self { service, interval }
    }

    /// Create a sweeper with an explicit interval.
    pub fn with_interval(service: Arc<SpatialLocationService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Spawn the sweep loop onto the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Run the sweep loop until cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        debug!(interval_s = self.interval.as_secs_f64(), "expiration sweeper started");
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("expiration sweeper cancelled");
                    break;
                }

                _ = ticker.tick() => {
                    let removed = self.service.sweep_expired();
                    if removed > 0 {
                        debug!(removed, "sweep removed expired geofences");
                    } else {
                        trace!("sweep found nothing expired");
                    }
                }
            }
        }
    }
}

//! The location/geofence coordination service.
//!
//! [`SpatialLocationService`] is the single owner of all mutable engine
//! state: the authorization tracker, the monitored-region registry, the last
//! known location, and the per-mode tracking state machines. Every public
//! operation and every inbound sensor event runs under one exclusive
//! section, so registry mutation, expiration sweeps, and event dispatch
//! never interleave inconsistently.
//!
//! # Architecture
//!
//! ```text
//! caller ──► SpatialLocationService ──► PositioningSensor (commands)
//!                  │    ▲
//!                  │    └── SensorEvent channel ◄── sensor callbacks
//!                  ▼
//!            EventDispatcher ──► EventSubscriber (app layer)
//! ```
//!
//! The service is explicitly constructed and explicitly owned — no global
//! instance. Independent services with independent sensors coexist freely,
//! which is how the tests are built.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::accuracy::{AccuracyProfile, ActivityType};
use crate::auth::{AuthorizationStatus, AuthorizationTracker, PermissionLevel};
use crate::events::{EventDispatcher, EventSubscriber, LocationEvent};
use crate::location::Location;
use crate::region::{MemoryAttributes, MemoryGeofence, Presence, Region, RegionRegistry};
use crate::sensor::{PositioningSensor, SensorEvent, SensorFailure};
use crate::sweeper::ExpiryExitPolicy;

use super::config::ServiceConfig;
use super::error::{Capability, LocationError};

/// State of one update mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// Not delivering updates.
    Idle,
    /// Delivering updates.
    Active,
    /// A sensor failure interrupted updates; cleared by an explicit stop or
    /// a successful restart.
    Error,
}

/// Snapshot of both update modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStatus {
    /// Continuous high-rate updates.
    pub continuous: TrackingState,
    /// Low-power significant-change updates.
    pub significant: TrackingState,
}

/// Mutable engine state; every access goes through the service's lock.
struct CoreState {
    auth: AuthorizationTracker,
    registry: RegionRegistry,
    last_location: Option<Location>,
    continuous: TrackingState,
    significant: TrackingState,
    accuracy: AccuracyProfile,
}

/// Coordinates positioning and geofence monitoring for one sensor.
pub struct SpatialLocationService {
    state: Mutex<CoreState>,
    dispatcher: EventDispatcher,
    sensor: Arc<dyn PositioningSensor>,
    /// Read-side of the authorization watch; never blocks on the state lock.
    auth_status: watch::Receiver<AuthorizationStatus>,
    config: ServiceConfig,
}

impl SpatialLocationService {
    /// Create a service over the given sensor collaborator.
    pub fn new(config: ServiceConfig, sensor: Arc<dyn PositioningSensor>) -> Self {
        let auth = AuthorizationTracker::new();
        let auth_status = auth.subscribe();
        Self {
            state: Mutex::new(CoreState {
                auth,
                registry: RegionRegistry::new(config.region_capacity),
                last_location: None,
                continuous: TrackingState::Idle,
                significant: TrackingState::Idle,
                accuracy: AccuracyProfile::default(),
            }),
            dispatcher: EventDispatcher::new(),
            sensor,
            auth_status,
            config,
        }
    }

    /// Create a service with the default configuration.
    pub fn with_defaults(sensor: Arc<dyn PositioningSensor>) -> Self {
        Self::new(ServiceConfig::default(), sensor)
    }

    /// The service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Subscriber
    // ─────────────────────────────────────────────────────────────────────

    /// Install, replace, or clear the event subscriber.
    pub fn set_subscriber(&self, subscriber: Option<Arc<dyn EventSubscriber>>) {
        self.dispatcher.set_subscriber(subscriber);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────

    /// The last known authorization status. Never blocks.
    pub fn authorization_status(&self) -> AuthorizationStatus {
        *self.auth_status.borrow()
    }

    /// Request permission at the given level.
    ///
    /// Idempotent: resolves immediately when the current status already
    /// satisfies the level. Otherwise the sensor collaborator's prompt is
    /// issued and this call awaits its asynchronous status callback — the
    /// state lock is not held while waiting. The inbound callback must be
    /// processed (via [`Self::handle_sensor_event`], normally by the running
    /// [`super::SensorEventLoop`]) for the wait to resolve.
    pub async fn request_permission(&self, level: PermissionLevel) -> AuthorizationStatus {
        let mut changes = {
            let state = self.state.lock();
            let current = state.auth.status();
            if current.satisfies(level) {
                debug!(%level, %current, "permission already satisfied");
                return current;
            }
            let changes = state.auth.subscribe();
            debug!(%level, %current, "issuing permission prompt");
            self.sensor.request_permission(level);
            changes
        };

        loop {
            if changes.changed().await.is_err() {
                // Tracker lives inside self; unreachable while borrowed.
                return *changes.borrow();
            }
            let status = *changes.borrow_and_update();
            if status != AuthorizationStatus::NotDetermined {
                return status;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Location updates
    // ─────────────────────────────────────────────────────────────────────

    /// Begin continuous location updates.
    ///
    /// Requires at least when-in-use authorization; callers must request
    /// permission first. Starting while already active is a no-op; starting
    /// from the error state retries.
    pub fn start_updating_location(&self) -> Result<(), LocationError> {
        let mut state = self.state.lock();
        Self::require(state.auth.status(), PermissionLevel::WhenInUse)?;

        if state.continuous == TrackingState::Active {
            trace!("continuous updates already active");
            return Ok(());
        }
        self.sensor.start_updates();
        state.continuous = TrackingState::Active;
        info!("continuous location updates started");
        Ok(())
    }

    /// Stop continuous location updates. Idempotent.
    pub fn stop_updating_location(&self) {
        let mut state = self.state.lock();
        if state.continuous == TrackingState::Idle {
            return;
        }
        self.sensor.stop_updates();
        state.continuous = TrackingState::Idle;
        info!("continuous location updates stopped");
    }

    /// Begin significant-change location updates.
    ///
    /// Same authorization gate as continuous updates, plus a capability
    /// check: not every platform offers the low-power mode.
    pub fn start_monitoring_significant_changes(&self) -> Result<(), LocationError> {
        let mut state = self.state.lock();
        Self::require(state.auth.status(), PermissionLevel::WhenInUse)?;
        if !self.sensor.capabilities().significant_change {
            return Err(LocationError::CapabilityUnavailable(
                Capability::SignificantChange,
            ));
        }

        if state.significant == TrackingState::Active {
            trace!("significant-change updates already active");
            return Ok(());
        }
        self.sensor.start_significant_change_updates();
        state.significant = TrackingState::Active;
        info!("significant-change updates started");
        Ok(())
    }

    /// Stop significant-change updates. Idempotent.
    pub fn stop_monitoring_significant_changes(&self) {
        let mut state = self.state.lock();
        if state.significant == TrackingState::Idle {
            return;
        }
        self.sensor.stop_significant_change_updates();
        state.significant = TrackingState::Idle;
        info!("significant-change updates stopped");
    }

    /// Map a semantic activity tag to an accuracy profile and apply it.
    ///
    /// Unrecognized tags fall back to the default profile; this never fails.
    /// Returns the applied profile.
    pub fn configure_accuracy_for_activity(&self, activity: &str) -> AccuracyProfile {
        let resolved = ActivityType::from_tag(activity);
        let profile = resolved.profile();

        let mut state = self.state.lock();
        state.accuracy = profile.clone();
        self.sensor.set_accuracy(profile.clone());
        debug!(tag = activity, %resolved, "accuracy profile configured");
        profile
    }

    /// The currently configured accuracy profile.
    pub fn accuracy_profile(&self) -> AccuracyProfile {
        self.state.lock().accuracy.clone()
    }

    /// Current state of both update modes.
    pub fn tracking_status(&self) -> TrackingStatus {
        let state = self.state.lock();
        TrackingStatus {
            continuous: state.continuous,
            significant: state.significant,
        }
    }

    /// The most recent accepted fix, if any.
    pub fn last_known_location(&self) -> Option<Location> {
        self.state.lock().last_location.clone()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Region monitoring
    // ─────────────────────────────────────────────────────────────────────

    /// Whether the platform supports geofence monitoring.
    pub fn is_monitoring_available(&self) -> bool {
        self.sensor.capabilities().region_monitoring
    }

    /// Whether the platform supports beacon-scale ranging.
    pub fn is_ranging_available(&self) -> bool {
        self.sensor.capabilities().ranging
    }

    /// Begin monitoring a region.
    ///
    /// Requires always authorization (the platform delivers crossings in the
    /// background). Replaces any monitored region with the same identifier
    /// atomically. Fails without mutation on insufficient authorization,
    /// missing capability, or a full registry.
    pub fn start_monitoring(&self, region: Region) -> Result<(), LocationError> {
        self.register(region, None)
    }

    /// Begin monitoring a memory geofence.
    ///
    /// Constructs and validates the region (positive finite radius, in-range
    /// center, well-formed identifier), then registers it with the memory
    /// attributes recorded for the expiration sweeper. The identifier names
    /// both the region and the memory.
    pub fn start_monitoring_memory(
        &self,
        identifier: &str,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), LocationError> {
        let region = Region::circular(identifier, latitude, longitude, radius_m)?;
        self.register(region, Some(MemoryAttributes { expires_at }))
    }

    fn register(
        &self,
        region: Region,
        memory: Option<MemoryAttributes>,
    ) -> Result<(), LocationError> {
        let mut state = self.state.lock();
        Self::require(state.auth.status(), PermissionLevel::Always)?;
        if !self.sensor.capabilities().region_monitoring {
            return Err(LocationError::CapabilityUnavailable(
                Capability::RegionMonitoring,
            ));
        }
        if !state.registry.contains(region.identifier())
            && state.registry.len() >= state.registry.capacity()
        {
            return Err(LocationError::CapacityExceeded {
                limit: state.registry.capacity(),
            });
        }

        // The sensor's own registration replaces same-identifier regions,
        // mirroring the registry's dedup rule.
        self.sensor.start_region_monitoring(&region)?;
        let identifier = region.identifier().to_string();
        let replaced = state.registry.insert(region, memory)?;
        info!(
            identifier = %identifier,
            replaced = replaced.is_some(),
            monitored = state.registry.len(),
            "region monitoring started"
        );
        Ok(())
    }

    /// Stop monitoring a region. Idempotent; unknown identifiers are a no-op.
    pub fn stop_monitoring(&self, identifier: &str) {
        let mut state = self.state.lock();
        match state.registry.remove(identifier) {
            Some(_) => {
                self.sensor.stop_region_monitoring(identifier);
                info!(identifier, "region monitoring stopped");
            }
            None => trace!(identifier, "stop for unmonitored region ignored"),
        }
    }

    /// Stop monitoring every region. Always succeeds.
    pub fn stop_monitoring_all(&self) {
        let mut state = self.state.lock();
        let removed = state.registry.clear();
        for entry in &removed {
            self.sensor.stop_region_monitoring(entry.region.identifier());
        }
        info!(count = removed.len(), "all region monitoring stopped");
    }

    /// Insertion-ordered snapshot of the monitored regions.
    pub fn monitored_regions(&self) -> Vec<Region> {
        self.state.lock().registry.snapshot()
    }

    /// Insertion-ordered snapshot of the monitored memory geofences.
    pub fn memory_geofences(&self) -> Vec<MemoryGeofence> {
        self.state.lock().registry.memory_geofences()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expiration sweeping
    // ─────────────────────────────────────────────────────────────────────

    /// Sweep expired memory geofences against the current time.
    ///
    /// Returns how many were removed. Safe to call from anywhere at any
    /// cadence; removal is idempotent.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    /// Sweep expired memory geofences against an explicit time.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.lock();
        self.sweep_locked(&mut state, now)
    }

    fn sweep_locked(&self, state: &mut CoreState, now: DateTime<Utc>) -> usize {
        let expired = state.registry.expired_identifiers(now);
        let mut removed = 0;
        for identifier in expired {
            let Some((region, presence)) = state
                .registry
                .get(&identifier)
                .map(|entry| (entry.region.clone(), entry.presence))
            else {
                continue;
            };

            let notify = match presence {
                Presence::Inside => true,
                Presence::Unknown => {
                    self.config.sweeper.exit_policy == ExpiryExitPolicy::AlwaysNotify
                }
                Presence::Outside => false,
            };
            // Exit notification precedes removal
            if notify {
                self.dispatcher.dispatch(LocationEvent::RegionExited(region));
            }
            state.registry.remove(&identifier);
            self.sensor.stop_region_monitoring(&identifier);
            info!(identifier = %identifier, notified = notify, "expired memory geofence removed");
            removed += 1;
        }
        removed
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sensor event handling
    // ─────────────────────────────────────────────────────────────────────

    /// Process one inbound sensor event.
    ///
    /// Each event is a discrete task: it acquires the exclusive section,
    /// updates state, dispatches resulting events, runs an inline expiration
    /// sweep, and releases. Normally called by [`super::SensorEventLoop`];
    /// tests call it directly for deterministic sequencing.
    pub fn handle_sensor_event(&self, event: SensorEvent) {
        let now = Utc::now();
        let mut state = self.state.lock();
        match event {
            SensorEvent::PositionFix(fix) => self.handle_fix(&mut state, fix),
            SensorEvent::RegionEntered { identifier } => {
                self.handle_crossing(&mut state, &identifier, Presence::Inside)
            }
            SensorEvent::RegionExited { identifier } => {
                self.handle_crossing(&mut state, &identifier, Presence::Outside)
            }
            SensorEvent::AuthorizationChanged(status) => {
                self.handle_authorization_change(&mut state, status)
            }
            SensorEvent::Failure(failure) => self.handle_failure(&mut state, failure),
        }
        self.sweep_locked(&mut state, now);
    }

    fn handle_fix(&self, state: &mut CoreState, fix: Location) {
        if let Some(last) = &state.last_location {
            if fix.timestamp < last.timestamp {
                debug!(%fix, last = %last, "stale fix rejected");
                return;
            }
        }
        state.last_location = Some(fix.clone());
        trace!(%fix, "position fix accepted");
        self.dispatcher.dispatch(LocationEvent::LocationUpdated(fix));
    }

    fn handle_crossing(&self, state: &mut CoreState, identifier: &str, presence: Presence) {
        match state.registry.mark_presence(identifier, presence) {
            Some(region) => {
                debug!(identifier, ?presence, "region crossing observed");
                let event = match presence {
                    Presence::Inside => LocationEvent::RegionEntered(region),
                    _ => LocationEvent::RegionExited(region),
                };
                self.dispatcher.dispatch(event);
            }
            None => {
                // Stale callback for a region stopped while the event was in
                // flight; dropping it is the documented behavior.
                debug!(identifier, "crossing for unmonitored region dropped");
            }
        }
    }

    fn handle_authorization_change(&self, state: &mut CoreState, status: AuthorizationStatus) {
        let changed = state.auth.apply(status);
        info!(%status, changed, "authorization status reported");
        self.dispatcher
            .dispatch(LocationEvent::AuthorizationChanged(status));

        if status.is_authorized() {
            return;
        }
        let was_updating = state.continuous == TrackingState::Active
            || state.significant == TrackingState::Active;
        if !was_updating {
            return;
        }

        if state.continuous == TrackingState::Active {
            self.sensor.stop_updates();
            state.continuous = TrackingState::Idle;
        }
        if state.significant == TrackingState::Active {
            self.sensor.stop_significant_change_updates();
            state.significant = TrackingState::Idle;
        }
        warn!(%status, "authorization revoked while location updates were active");
        self.dispatcher
            .dispatch(LocationEvent::MonitoringFailed(
                LocationError::AuthorizationRevoked { status },
            ));
    }

    fn handle_failure(&self, state: &mut CoreState, failure: SensorFailure) {
        warn!(error = %failure, "sensor reported failure");
        if state.continuous == TrackingState::Active {
            state.continuous = TrackingState::Error;
        }
        if state.significant == TrackingState::Active {
            state.significant = TrackingState::Error;
        }
        self.dispatcher
            .dispatch(LocationEvent::MonitoringFailed(LocationError::Sensor(
                failure,
            )));
    }

    fn require(
        current: AuthorizationStatus,
        required: PermissionLevel,
    ) -> Result<(), LocationError> {
        if current.satisfies(required) {
            Ok(())
        } else {
            Err(LocationError::Unauthorized { required, current })
        }
    }
}

impl std::fmt::Debug for SpatialLocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SpatialLocationService")
            .field("authorization", &state.auth.status())
            .field("monitored", &state.registry.len())
            .field("continuous", &state.continuous)
            .field("significant", &state.significant)
            .finish()
    }
}

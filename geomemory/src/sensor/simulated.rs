//! A scriptable in-process sensor.
//!
//! Tests and the demo CLI stand in for positioning hardware with
//! [`SimulatedSensor`]: it records every command the engine issues, emits
//! whatever callback events the script decides, and can auto-answer
//! permission prompts.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::accuracy::AccuracyProfile;
use crate::auth::{AuthorizationStatus, PermissionLevel};
use crate::location::Location;
use crate::region::Region;

use super::{PositioningSensor, SensorCapabilities, SensorEvent, SensorFailure};

/// A command the engine issued, recorded for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorCommand {
    /// Permission prompt requested.
    RequestPermission(PermissionLevel),
    /// Accuracy profile applied.
    SetAccuracy(AccuracyProfile),
    /// Continuous updates started.
    StartUpdates,
    /// Continuous updates stopped.
    StopUpdates,
    /// Significant-change updates started.
    StartSignificantChangeUpdates,
    /// Significant-change updates stopped.
    StopSignificantChangeUpdates,
    /// Region registered, by identifier.
    StartRegionMonitoring(String),
    /// Region deregistered, by identifier.
    StopRegionMonitoring(String),
}

/// Scriptable sensor double.
pub struct SimulatedSensor {
    capabilities: SensorCapabilities,
    commands: Mutex<Vec<SensorCommand>>,
    /// Auto-response to permission prompts, if configured.
    grant: Mutex<Option<AuthorizationStatus>>,
    /// Synchronous refusal for region registrations, if configured.
    region_refusal: Mutex<Option<SensorFailure>>,
    events: mpsc::UnboundedSender<SensorEvent>,
}

impl SimulatedSensor {
    /// Create a fully capable sensor and the event channel it feeds.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SensorEvent>) {
        Self::with_capabilities(SensorCapabilities::full())
    }

    /// Create a sensor with explicit capability flags.
    pub fn with_capabilities(
        capabilities: SensorCapabilities,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SensorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sensor = Arc::new(Self {
            capabilities,
            commands: Mutex::new(Vec::new()),
            grant: Mutex::new(None),
            region_refusal: Mutex::new(None),
            events: tx,
        });
        (sensor, rx)
    }

    /// Configure the status emitted in response to permission prompts.
    ///
    /// `None` (the initial setting) leaves prompts unanswered until the
    /// script emits a status itself.
    pub fn grant_on_request(&self, status: Option<AuthorizationStatus>) {
        *self.grant.lock() = status;
    }

    /// Configure region registrations to be refused synchronously.
    pub fn refuse_region_monitoring(&self, failure: Option<SensorFailure>) {
        *self.region_refusal.lock() = failure;
    }

    /// Emit a raw callback event. Returns false once the receiver is gone.
    pub fn emit(&self, event: SensorEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Emit a position fix stamped with the current time.
    pub fn emit_fix(&self, latitude: f64, longitude: f64, accuracy_m: f64) -> bool {
        self.emit(SensorEvent::PositionFix(Location::new(
            latitude, longitude, accuracy_m,
        )))
    }

    /// Emit a region-entry callback.
    pub fn emit_region_entered(&self, identifier: impl Into<String>) -> bool {
        self.emit(SensorEvent::RegionEntered {
            identifier: identifier.into(),
        })
    }

    /// Emit a region-exit callback.
    pub fn emit_region_exited(&self, identifier: impl Into<String>) -> bool {
        self.emit(SensorEvent::RegionExited {
            identifier: identifier.into(),
        })
    }

    /// Emit an authorization status change.
    pub fn emit_authorization(&self, status: AuthorizationStatus) -> bool {
        self.emit(SensorEvent::AuthorizationChanged(status))
    }

    /// Emit a sensor failure.
    pub fn emit_failure(&self, message: impl Into<String>) -> bool {
        self.emit(SensorEvent::Failure(SensorFailure::new(message)))
    }

    /// Snapshot of the commands issued so far, in order.
    pub fn commands(&self) -> Vec<SensorCommand> {
        self.commands.lock().clone()
    }

    /// Drain and return the recorded commands.
    pub fn take_commands(&self) -> Vec<SensorCommand> {
        std::mem::take(&mut self.commands.lock())
    }

    fn record(&self, command: SensorCommand) {
        debug!(?command, "simulated sensor command");
        self.commands.lock().push(command);
    }
}

impl PositioningSensor for SimulatedSensor {
    fn capabilities(&self) -> SensorCapabilities {
        self.capabilities
    }

    fn request_permission(&self, level: PermissionLevel) {
        self.record(SensorCommand::RequestPermission(level));
        if let Some(status) = *self.grant.lock() {
            self.emit(SensorEvent::AuthorizationChanged(status));
        }
    }

    fn set_accuracy(&self, profile: AccuracyProfile) {
        self.record(SensorCommand::SetAccuracy(profile));
    }

    fn start_updates(&self) {
        self.record(SensorCommand::StartUpdates);
    }

    fn stop_updates(&self) {
        self.record(SensorCommand::StopUpdates);
    }

    fn start_significant_change_updates(&self) {
        self.record(SensorCommand::StartSignificantChangeUpdates);
    }

    fn stop_significant_change_updates(&self) {
        self.record(SensorCommand::StopSignificantChangeUpdates);
    }

    fn start_region_monitoring(&self, region: &Region) -> Result<(), SensorFailure> {
        if let Some(failure) = self.region_refusal.lock().clone() {
            return Err(failure);
        }
        self.record(SensorCommand::StartRegionMonitoring(
            region.identifier().to_string(),
        ));
        Ok(())
    }

    fn stop_region_monitoring(&self, identifier: &str) {
        self.record(SensorCommand::StopRegionMonitoring(identifier.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_commands_in_order() {
        let (sensor, _rx) = SimulatedSensor::new();
        sensor.start_updates();
        sensor.stop_updates();

        assert_eq!(
            sensor.commands(),
            vec![SensorCommand::StartUpdates, SensorCommand::StopUpdates]
        );
    }

    #[tokio::test]
    async fn test_emit_reaches_receiver() {
        let (sensor, mut rx) = SimulatedSensor::new();
        sensor.emit_region_entered("kitchen");

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SensorEvent::RegionEntered {
                identifier: "kitchen".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_grant_on_request_answers_prompt() {
        let (sensor, mut rx) = SimulatedSensor::new();
        sensor.grant_on_request(Some(AuthorizationStatus::WhenInUse));
        sensor.request_permission(PermissionLevel::WhenInUse);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SensorEvent::AuthorizationChanged(AuthorizationStatus::WhenInUse)
        );
    }

    #[test]
    fn test_unanswered_prompt_emits_nothing() {
        let (sensor, mut rx) = SimulatedSensor::new();
        sensor.request_permission(PermissionLevel::Always);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_region_refusal() {
        let (sensor, _rx) = SimulatedSensor::new();
        sensor.refuse_region_monitoring(Some(SensorFailure::new("no geofencing hardware")));

        let region = Region::circular("kitchen", 40.0, -73.9, 50.0).unwrap();
        assert!(sensor.start_region_monitoring(&region).is_err());
        // Refused registrations are not recorded as accepted commands
        assert!(sensor.commands().is_empty());
    }
}

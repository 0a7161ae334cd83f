//! Integration tests for the coordination engine.
//!
//! These tests verify the complete flow including:
//! - Sensor callback → event loop → service state → subscriber
//! - Permission prompt round-trips through the simulated sensor
//! - Periodic expiration sweeping with the background daemon
//! - Clean cancellation of the long-running tasks
//!
//! Run with: `cargo test --test coordinator_integration`

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use geomemory::auth::{AuthorizationStatus, PermissionLevel};
use geomemory::events::{LocationEvent, RecordingSubscriber};
use geomemory::sensor::{SensorCommand, SimulatedSensor};
use geomemory::service::{SensorEventLoop, ServiceConfig, SpatialLocationService};
use geomemory::sweeper::{ExpirationSweeper, SweeperConfig};

// ============================================================================
// Helper Functions
// ============================================================================

struct Fixture {
    service: Arc<SpatialLocationService>,
    sensor: Arc<SimulatedSensor>,
    recorder: Arc<RecordingSubscriber>,
    shutdown: CancellationToken,
    loop_handle: tokio::task::JoinHandle<()>,
}

/// Stand up a service with a running event loop and a recording subscriber.
fn start_engine(config: ServiceConfig) -> Fixture {
    let (sensor, events) = SimulatedSensor::new();
    let service = Arc::new(SpatialLocationService::new(config, sensor.clone()));
    let recorder = RecordingSubscriber::new();
    service.set_subscriber(Some(recorder.clone()));

    let shutdown = CancellationToken::new();
    let loop_handle = SensorEventLoop::new(Arc::clone(&service), events).spawn(shutdown.clone());

    Fixture {
        service,
        sensor,
        recorder,
        shutdown,
        loop_handle,
    }
}

/// Let spawned tasks drain their queues.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ============================================================================
// Integration Tests
// ============================================================================

/// The full happy path: grant permission, start updates, monitor a memory
/// geofence, walk through it, and watch events arrive in order.
#[tokio::test]
async fn test_sensor_to_subscriber_flow() {
    let fixture = start_engine(ServiceConfig::default());
    let service = &fixture.service;

    // Permission prompt resolves through the sensor's async callback
    fixture
        .sensor
        .grant_on_request(Some(AuthorizationStatus::Always));
    let status = service.request_permission(PermissionLevel::Always).await;
    assert_eq!(status, AuthorizationStatus::Always);

    service.start_updating_location().unwrap();
    service
        .start_monitoring_memory("kitchen", 40.0, -73.9, 50.0, None)
        .unwrap();

    // A fix, then a crossing
    fixture.sensor.emit_fix(40.0, -73.905, 10.0);
    fixture.sensor.emit_region_entered("kitchen");
    settle().await;

    let last = service.last_known_location().expect("fix should be retained");
    assert_eq!(last.longitude, -73.905);

    let events = fixture.recorder.events();
    // AuthorizationChanged, LocationUpdated, RegionEntered — in that order
    assert_eq!(events.len(), 3, "events: {:?}", events);
    assert!(matches!(events[0], LocationEvent::AuthorizationChanged(_)));
    assert!(matches!(events[1], LocationEvent::LocationUpdated(_)));
    assert!(matches!(events[2], LocationEvent::RegionEntered(_)));

    fixture.shutdown.cancel();
    fixture.loop_handle.await.unwrap();
}

/// The periodic sweeper retires an expired geofence without any manual
/// sweep call, and tells the sensor to stop monitoring it.
#[tokio::test]
async fn test_background_sweeper_removes_expired_geofence() {
    let config = ServiceConfig {
        sweeper: SweeperConfig {
            interval: Duration::from_millis(20),
            ..SweeperConfig::default()
        },
        ..ServiceConfig::default()
    };
    let fixture = start_engine(config);
    let service = &fixture.service;

    fixture
        .sensor
        .emit_authorization(AuthorizationStatus::Always);
    settle().await;

    service
        .start_monitoring_memory(
            "errand",
            40.0,
            -73.9,
            50.0,
            Some(Utc::now() - chrono::Duration::seconds(1)),
        )
        .unwrap();
    assert_eq!(service.monitored_regions().len(), 1);

    let sweeper_handle = ExpirationSweeper::new(Arc::clone(service))
        .spawn(fixture.shutdown.clone());
    settle().await;

    assert!(service.monitored_regions().is_empty());
    assert!(service.memory_geofences().is_empty());
    assert!(fixture
        .sensor
        .commands()
        .contains(&SensorCommand::StopRegionMonitoring("errand".to_string())));

    fixture.shutdown.cancel();
    sweeper_handle.await.unwrap();
    fixture.loop_handle.await.unwrap();
}

/// Revocation mid-flight: the loop processes the status change, stops
/// updates, and the subscriber sees the failure exactly once.
#[tokio::test]
async fn test_revocation_through_event_loop() {
    let fixture = start_engine(ServiceConfig::default());
    let service = &fixture.service;

    fixture
        .sensor
        .emit_authorization(AuthorizationStatus::Always);
    settle().await;
    service.start_updating_location().unwrap();

    fixture
        .sensor
        .emit_authorization(AuthorizationStatus::Denied);
    settle().await;

    let failures = fixture
        .recorder
        .events()
        .iter()
        .filter(|e| matches!(e, LocationEvent::MonitoringFailed(_)))
        .count();
    assert_eq!(failures, 1);
    assert_eq!(
        service.authorization_status(),
        AuthorizationStatus::Denied
    );

    fixture.shutdown.cancel();
    fixture.loop_handle.await.unwrap();
}

/// Cancelling the shutdown token stops the loop even with events pending,
/// and a stale crossing emitted before shutdown is simply dropped once its
/// region is gone.
#[tokio::test]
async fn test_stop_all_then_stale_callback() {
    let fixture = start_engine(ServiceConfig::default());
    let service = &fixture.service;

    fixture
        .sensor
        .emit_authorization(AuthorizationStatus::Always);
    settle().await;

    service
        .start_monitoring_memory("kitchen", 40.0, -73.9, 50.0, None)
        .unwrap();
    service.stop_monitoring_all();

    // Sensor had the enter event in flight before it processed the stop
    fixture.sensor.emit_region_entered("kitchen");
    settle().await;

    let crossings = fixture
        .recorder
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e,
                LocationEvent::RegionEntered(_) | LocationEvent::RegionExited(_)
            )
        })
        .count();
    assert_eq!(crossings, 0, "stale crossing must be dropped");

    fixture.shutdown.cancel();
    fixture.loop_handle.await.unwrap();
}

/// Two engines over two sensors are fully independent.
#[tokio::test]
async fn test_independent_service_instances() {
    let first = start_engine(ServiceConfig::default());
    let second = start_engine(ServiceConfig::default());

    first
        .sensor
        .emit_authorization(AuthorizationStatus::Always);
    settle().await;

    first
        .service
        .start_monitoring_memory("kitchen", 40.0, -73.9, 50.0, None)
        .unwrap();

    assert_eq!(first.service.monitored_regions().len(), 1);
    assert!(second.service.monitored_regions().is_empty());
    assert_eq!(
        second.service.authorization_status(),
        AuthorizationStatus::NotDetermined
    );

    first.shutdown.cancel();
    second.shutdown.cancel();
    first.loop_handle.await.unwrap();
    second.loop_handle.await.unwrap();
}

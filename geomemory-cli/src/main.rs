//! GeoMemory CLI - scripted demo runner
//!
//! Replays a simulated walk past a memory geofence through the coordination
//! engine and prints every dispatched event as a JSON line. Useful for
//! eyeballing event ordering, expiration behavior, and log output without
//! real positioning hardware.
//!
//! ```text
//! geomemory --lat 40.0 --lon -73.9 --radius 120 --expire-after-s 2
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use geomemory::auth::{AuthorizationStatus, PermissionLevel};
use geomemory::events::{EventSubscriber, LocationEvent};
use geomemory::region::Region;
use geomemory::sensor::SimulatedSensor;
use geomemory::service::{SensorEventLoop, ServiceConfig, SpatialLocationService};
use geomemory::sweeper::{ExpirationSweeper, SweeperConfig};

/// Meters per degree of latitude, good enough for a demo walk.
const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Parser, Debug)]
#[command(name = "geomemory", version = geomemory::VERSION)]
#[command(about = "Replay a simulated walk past a memory geofence")]
struct Args {
    /// Geofence center latitude in degrees
    #[arg(long, default_value_t = 40.0)]
    lat: f64,

    /// Geofence center longitude in degrees
    #[arg(long, default_value_t = -73.9)]
    lon: f64,

    /// Geofence radius in meters
    #[arg(long, default_value_t = 120.0)]
    radius: f64,

    /// Number of simulated position fixes
    #[arg(long, default_value_t = 24)]
    steps: u32,

    /// Milliseconds between fixes
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Expire the geofence this many seconds after starting the walk
    #[arg(long)]
    expire_after_s: Option<i64>,

    /// Activity profile tag (fitness, automotive, airborne, other)
    #[arg(long, default_value = "fitness")]
    activity: String,
}

/// Prints every engine event as one JSON line on stdout.
struct JsonLinePrinter;

impl EventSubscriber for JsonLinePrinter {
    fn on_event(&self, event: LocationEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "event not serializable"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    geomemory::logging::init_logging()?;

    let (sensor, events) = SimulatedSensor::new();
    sensor.grant_on_request(Some(AuthorizationStatus::Always));

    let config = ServiceConfig {
        sweeper: SweeperConfig {
            interval: Duration::from_millis(250),
            ..SweeperConfig::default()
        },
        ..ServiceConfig::default()
    };
    let service = Arc::new(SpatialLocationService::new(config, sensor.clone()));
    service.set_subscriber(Some(Arc::new(JsonLinePrinter)));

    let shutdown = CancellationToken::new();
    let loop_handle = SensorEventLoop::new(Arc::clone(&service), events).spawn(shutdown.clone());
    let sweeper_handle = ExpirationSweeper::new(Arc::clone(&service)).spawn(shutdown.clone());

    let status = service.request_permission(PermissionLevel::Always).await;
    info!(%status, "permission resolved");

    service.configure_accuracy_for_activity(&args.activity);
    service.start_updating_location()?;

    let expires_at = args
        .expire_after_s
        .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs));
    service.start_monitoring_memory("demo-memory", args.lat, args.lon, args.radius, expires_at)?;

    // Local copy of the geometry so the walk can decide when the simulated
    // platform would report a crossing.
    let fence = Region::circular("demo-memory", args.lat, args.lon, args.radius)?;

    // Walk due north through the fence: start three radii south, end three
    // radii north.
    let radius_deg = args.radius / METERS_PER_DEGREE;
    let start_lat = args.lat - 3.0 * radius_deg;
    let span_deg = 6.0 * radius_deg;

    let denominator = f64::from(args.steps.saturating_sub(1)).max(1.0);
    let mut was_inside = false;
    for step in 0..args.steps {
        let progress = f64::from(step) / denominator;
        let cur_lat = start_lat + progress * span_deg;

        sensor.emit_fix(cur_lat, args.lon, 10.0);

        let inside = fence.contains(cur_lat, args.lon);
        if inside != was_inside {
            // If the fence already expired, the engine drops the crossing.
            if inside {
                sensor.emit_region_entered("demo-memory");
            } else {
                sensor.emit_region_exited("demo-memory");
            }
            was_inside = inside;
        }

        tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
    }

    // Let the sweeper catch a pending expiration before reporting
    tokio::time::sleep(Duration::from_millis(300)).await;

    if let Some(last) = service.last_known_location() {
        info!(%last, "final position");
    }
    info!(
        monitored = service.monitored_regions().len(),
        "walk complete"
    );

    shutdown.cancel();
    loop_handle.await?;
    sweeper_handle.await?;
    Ok(())
}

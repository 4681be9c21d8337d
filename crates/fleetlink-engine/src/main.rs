//! Server binary for the Fleetlink simulation.
//!
//! Wires the world, the tick loop, the controller session listener and
//! the observer together and runs until the tick limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `fleetlink-config.yaml`
//! 3. Build the world from the configured fleet
//! 4. Create run control and the snapshot broadcaster
//! 5. Start the Observer API server
//! 6. Bind the session listener and print its address
//! 7. Install the Ctrl-C handler
//! 8. Run the tick loop
//! 9. Drain sessions and the observer, log the result

mod error;

use std::path::Path;
use std::sync::Arc;

use fleetlink_core::config::FleetConfig;
use fleetlink_core::runner::{self, SimulationControl};
use fleetlink_core::{SnapshotBroadcaster, World, WorldHandle};
use fleetlink_observer::{AppState, ServerConfig};
use fleetlink_server::{SessionContext, SessionManager, VehiclePool};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "fleetlink-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("fleetlink-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        tick_interval_ms = config.simulation.tick_interval_ms,
        max_ticks = config.simulation.max_ticks,
        vehicles = config.fleet.len(),
        "Configuration loaded"
    );

    // 3. Build the world.
    let world = World::new(config.build_vehicles()).map_err(EngineError::from)?;
    let initial = world.snapshot();
    let pool = VehiclePool::new(world.vehicle_ids());
    let world = WorldHandle::new(world);
    info!(vehicles = pool.len(), "World created");

    // 4. Run control and broadcaster.
    let control = Arc::new(SimulationControl::new(
        config.simulation.tick_interval_ms,
        config.simulation.max_ticks,
    ));
    let broadcaster = SnapshotBroadcaster::new(config.network.broadcast_capacity, initial);

    // 5. Start Observer API server.
    let observer_config = ServerConfig {
        host: config.network.host.clone(),
        port: config.network.observer_port,
    };
    let app_state = Arc::new(AppState::new(broadcaster.clone(), Arc::clone(&control)));
    let observer = fleetlink_observer::spawn_observer(&observer_config, app_state)
        .await
        .map_err(|e| EngineError::Observer {
            message: format!("{e}"),
        })?;
    info!(addr = %observer.addr, "Observer API server started");

    // 6. Bind the session listener.
    let session_addr = format!("{}:{}", config.network.host, config.network.session_port);
    let ctx = SessionContext {
        world: world.clone(),
        broadcaster: broadcaster.clone(),
        pool,
        control: Arc::clone(&control),
    };
    let manager = SessionManager::bind(&session_addr, ctx)
        .await
        .map_err(EngineError::from)?;
    let bound = manager.local_addr().map_err(EngineError::from)?;
    println!("fleetlink listening on {bound}");
    info!(addr = %bound, "Session listener started");
    let sessions = tokio::spawn(manager.serve());

    // 7. Ctrl-C requests a clean stop.
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "Ctrl-C handler unavailable"),
            }
        });
    }

    // 8. Run the simulation.
    let mut callback = broadcaster;
    let result = runner::run_simulation(&world, &control, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 9. Stop everything that waits on the control, then log results.
    control.request_stop();
    if let Err(e) = sessions.await {
        warn!(error = %e, "Session listener task failed");
    }
    if let Err(e) = observer.task.await {
        warn!(error = %e, "Observer task failed");
    }

    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "fleetlink-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `fleetlink-config.yaml`, falling back to the
/// defaults (with environment overrides) if the file does not exist.
fn load_config() -> Result<FleetConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(FleetConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        let mut config = FleetConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }
}
